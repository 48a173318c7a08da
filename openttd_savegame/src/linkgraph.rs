/// Cargo link graph projection
///
/// `LGRP` stores one record per link graph component: a cargo and a
/// node list, where each node's edges form a linked list over node
/// slots. This flattens that storage into a per-cargo station-to-station
/// view, which is what automation actually wants to consume.
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::record::Value;
use crate::savegame::Savegame;

/// Chunk tag holding the cargo link graphs.
const LINK_GRAPH_TAG: &str = "LGRP";

#[derive(Debug, Error)]
pub enum LinkGraphError {
    #[error("link graph record is missing field {0:?}")]
    MissingField(&'static str),
    #[error("link graph edge points at node {0}, which does not exist")]
    UnknownNode(u64),
}

/// Transported amounts on one directed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStat {
    pub capacity: u64,
    pub usage: u64,
}

/// cargo -> origin station -> destination station -> stats
pub type LinkGraph = IndexMap<u64, IndexMap<u64, IndexMap<u64, LinkStat>>>;

/// Project the decoded `LGRP` records into station-to-station links.
///
/// Node `i`'s walk starts at its own slot; each edge in list order
/// advances the cursor to that edge's `next_edge`, and the walk ends
/// before it would step back onto `i`. Links without capacity are
/// dropped. A savegame without link graphs projects to an empty map.
pub fn project(savegame: &Savegame) -> Result<LinkGraph, LinkGraphError> {
    let mut graph = LinkGraph::new();
    let chunk = match savegame.chunks.get(LINK_GRAPH_TAG) {
        Some(chunk) => chunk,
        None => return Ok(graph),
    };

    for component in chunk.records.values() {
        let cargo = field_u64(component.get("cargo"), "cargo")?;
        let nodes = component
            .get("nodes")
            .and_then(Value::as_list)
            .ok_or(LinkGraphError::MissingField("nodes"))?;
        let stations = nodes
            .iter()
            .map(|node| field_u64(node.get("station"), "station"))
            .collect::<Result<Vec<_>, _>>()?;

        for (origin, node) in nodes.iter().enumerate() {
            let edges = node
                .get("edges")
                .and_then(Value::as_list)
                .ok_or(LinkGraphError::MissingField("edges"))?;
            for edge in edges {
                let next = field_u64(edge.get("next_edge"), "next_edge")?;
                if next as usize == origin {
                    break;
                }
                let capacity = field_u64(edge.get("capacity"), "capacity")?;
                let usage = field_u64(edge.get("usage"), "usage")?;
                if capacity != 0 {
                    let station = *stations
                        .get(next as usize)
                        .ok_or(LinkGraphError::UnknownNode(next))?;
                    graph
                        .entry(cargo)
                        .or_insert_with(IndexMap::new)
                        .entry(stations[origin])
                        .or_insert_with(IndexMap::new)
                        .insert(station, LinkStat { capacity, usage });
                }
            }
        }
    }

    Ok(graph)
}

fn field_u64(value: Option<&Value>, name: &'static str) -> Result<u64, LinkGraphError> {
    value
        .and_then(Value::as_u64)
        .ok_or(LinkGraphError::MissingField(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::savegame::{Chunk, Savegame};
    use assert_matches::assert_matches;
    use indexmap::IndexMap;

    fn edge(capacity: u64, usage: u64, next_edge: u64) -> Value {
        let mut record = Record::new();
        record.insert("capacity".to_string(), Value::U32(capacity as u32));
        record.insert("usage".to_string(), Value::U32(usage as u32));
        record.insert("next_edge".to_string(), Value::U16(next_edge as u16));
        Value::Struct(record)
    }

    fn node(station: u64, edges: Vec<Value>) -> Value {
        let mut record = Record::new();
        record.insert("station".to_string(), Value::U16(station as u16));
        record.insert("edges".to_string(), Value::List(edges));
        Value::Struct(record)
    }

    fn savegame_with_components(components: Vec<Record>) -> Savegame {
        let mut records = IndexMap::new();
        for (index, component) in components.into_iter().enumerate() {
            records.insert(index.to_string(), component);
        }
        let mut chunks = IndexMap::new();
        chunks.insert(
            "LGRP".to_string(),
            Chunk {
                headers: IndexMap::new(),
                records,
            },
        );
        Savegame {
            savegame_version: 300,
            chunks,
        }
    }

    fn component(cargo: u64, nodes: Vec<Value>) -> Record {
        let mut record = Record::new();
        record.insert("cargo".to_string(), Value::U8(cargo as u8));
        record.insert("nodes".to_string(), Value::List(nodes));
        record
    }

    #[test]
    fn two_station_component_projects_one_link() {
        let game = savegame_with_components(vec![component(
            3,
            vec![
                node(100, vec![edge(1, 1, 1), edge(0, 0, 0)]),
                node(200, vec![edge(1, 1, 1), edge(0, 0, 0)]),
            ],
        )]);

        let graph = project(&game).unwrap();

        assert_eq!(graph.len(), 1);
        assert_eq!(graph[&3].len(), 1);
        assert_eq!(graph[&3][&100].len(), 1);
        assert_eq!(
            graph[&3][&100][&200],
            LinkStat {
                capacity: 1,
                usage: 1
            }
        );
    }

    #[test]
    fn zero_capacity_links_are_dropped() {
        let game = savegame_with_components(vec![component(
            0,
            vec![
                node(10, vec![edge(0, 0, 1), edge(0, 0, 0)]),
                node(20, vec![edge(0, 0, 0)]),
            ],
        )]);

        let graph = project(&game).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn no_linkgraph_chunk_is_an_empty_graph() {
        let game = Savegame {
            savegame_version: 300,
            chunks: IndexMap::new(),
        };
        assert!(project(&game).unwrap().is_empty());
    }

    #[test]
    fn missing_fields_are_reported() {
        let mut broken = Record::new();
        broken.insert("cargo".to_string(), Value::U8(1));
        let game = savegame_with_components(vec![broken]);
        assert_matches!(project(&game), Err(LinkGraphError::MissingField("nodes")));
    }

    #[test]
    fn dangling_next_edge_is_reported() {
        let game = savegame_with_components(vec![component(
            1,
            vec![node(10, vec![edge(1, 1, 7)])],
        )]);
        assert_matches!(project(&game), Err(LinkGraphError::UnknownNode(7)));
    }
}
