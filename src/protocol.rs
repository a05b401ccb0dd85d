// File: src/protocol.rs
//! Line protocol spoken by the `nb_engine` binary.
//!
//! One command per line, fields separated by whitespace. Feature lists are
//! written `f:w,f:w` (the weight defaults to 1), item lists `a,b,c`, and a
//! lone `-` stands for an empty list.

use crate::core::types::{ItemId, WeightedFeature};
use crate::error::{NbError, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init { dicts: PathBuf },
    Update { item: ItemId, features: Vec<WeightedFeature>, dependencies: Vec<ItemId> },
    Delete { item: ItemId, features: Vec<WeightedFeature>, dependencies: Vec<ItemId> },
    Overwrite { item: ItemId, dependencies: Vec<ItemId> },
    Predict { features: Vec<WeightedFeature>, candidates: Vec<ItemId> },
    Eval { features: Vec<WeightedFeature>, candidates: Vec<ItemId>, dependencies: Vec<ItemId> },
    Stats,
    Save,
    Exit,
}

fn protocol_error(reason: impl Into<String>) -> NbError {
    NbError::Protocol { reason: reason.into() }
}

fn parse_id(raw: &str) -> Result<usize> {
    raw.parse().map_err(|_| protocol_error(format!("'{}' is not an id", raw)))
}

pub fn parse_items(raw: &str) -> Result<Vec<ItemId>> {
    if raw == "-" {
        return Ok(Vec::new());
    }
    raw.split(',').filter(|s| !s.is_empty()).map(parse_id).collect()
}

pub fn parse_features(raw: &str) -> Result<Vec<WeightedFeature>> {
    if raw == "-" {
        return Ok(Vec::new());
    }
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|token| match token.split_once(':') {
            Some((feature, weight)) => {
                let parsed: f64 = weight
                    .parse()
                    .map_err(|_| protocol_error(format!("'{}' is not a weight", weight)))?;
                if !(parsed.is_finite() && parsed >= 0.0) {
                    return Err(protocol_error(format!("weight '{}' must be finite and non-negative", weight)));
                }
                Ok((parse_id(feature)?, parsed))
            }
            None => Ok((parse_id(token)?, 1.0)),
        })
        .collect()
}

fn expect_args<'a>(name: &str, args: &'a [&'a str], count: usize) -> Result<&'a [&'a str]> {
    if args.len() != count {
        return Err(protocol_error(format!("{} takes {} arguments, got {}", name, count, args.len())));
    }
    Ok(args)
}

pub fn parse_command(line: &str) -> Result<Command> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (name, args) = parts.split_first().ok_or_else(|| protocol_error("empty line"))?;

    let command = match *name {
        "INIT" => {
            let args = expect_args(name, args, 1)?;
            Command::Init { dicts: PathBuf::from(args[0]) }
        }
        "UPDATE" | "DELETE" => {
            let args = expect_args(name, args, 3)?;
            let item = parse_id(args[0])?;
            let features = parse_features(args[1])?;
            let dependencies = parse_items(args[2])?;
            if *name == "UPDATE" {
                Command::Update { item, features, dependencies }
            } else {
                Command::Delete { item, features, dependencies }
            }
        }
        "OVERWRITE" => {
            let args = expect_args(name, args, 2)?;
            Command::Overwrite { item: parse_id(args[0])?, dependencies: parse_items(args[1])? }
        }
        "PREDICT" => {
            let args = expect_args(name, args, 2)?;
            Command::Predict { features: parse_features(args[0])?, candidates: parse_items(args[1])? }
        }
        "EVAL" => {
            let args = expect_args(name, args, 3)?;
            Command::Eval {
                features: parse_features(args[0])?,
                candidates: parse_items(args[1])?,
                dependencies: parse_items(args[2])?,
            }
        }
        "STATS" => Command::Stats,
        "SAVE" => Command::Save,
        "EXIT" => Command::Exit,
        other => return Err(protocol_error(format!("unknown command '{}'", other))),
    };
    Ok(command)
}

/// Formats a ranking as `RANKING id:score id:score ...`.
pub fn format_ranking(ranking: &[(ItemId, f64)]) -> String {
    let mut line = String::from("RANKING");
    for (item, score) in ranking {
        line.push_str(&format!(" {}:{:.6}", item, score));
    }
    line
}
