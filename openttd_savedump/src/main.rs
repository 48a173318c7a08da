use std::env;
use std::fs::File;
use std::io::Read;

use openttd_savegame::{linkgraph, parse_savegame, Savegame, DEFAULT_CHUNK_SIZE};

fn main() {
    env_logger::init();

    let mut linkgraph_only = false;
    let mut path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--linkgraph" => linkgraph_only = true,
            _ => path = Some(arg),
        }
    }
    let path = match path {
        Some(path) => path,
        None => {
            eprintln!("usage: openttd_savedump [--linkgraph] <savegame>");
            std::process::exit(2);
        }
    };

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to open {path}: {err}");
            std::process::exit(1);
        }
    };

    let game = match parse_savegame(file_chunks(file)) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("failed to parse {path}: {err}");
            std::process::exit(1);
        }
    };

    match dump(&game, linkgraph_only) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to dump {path}: {err}");
            std::process::exit(1);
        }
    }
}

fn dump(game: &Savegame, linkgraph_only: bool) -> Result<String, Box<dyn std::error::Error>> {
    if linkgraph_only {
        Ok(serde_json::to_string(&linkgraph::project(game)?)?)
    } else {
        Ok(serde_json::to_string(game)?)
    }
}

/// Feed the file to the decoder in lazy chunks so large savegames never
/// sit in memory whole.
fn file_chunks(mut file: File) -> impl Iterator<Item = Vec<u8>> {
    let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
    std::iter::from_fn(move || match file.read(&mut buf) {
        Ok(0) => None,
        Ok(n) => Some(buf[..n].to_vec()),
        Err(err) => {
            // Surfaces as UnexpectedEof in the decoder
            log::warn!("read failed, treating as end of input: {err}");
            None
        }
    })
}
