//! Consensus command implementation.

use super::read_json;
use crate::cli::ConsensusArgs;
use crate::engine::Engine;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use plutarch_domain::{Claim, SourceChunk};
use plutarch_extractor::source_domain;
use serde::Deserialize;

/// Execute the consensus command.
pub fn execute_consensus(
    args: ConsensusArgs,
    engine: Engine,
    formatter: &Formatter,
) -> Result<()> {
    let mut engine = engine.with_person(args.person.as_deref());

    if let Some(path) = &args.chunks {
        let chunks = read_json::<ChunkInput>(path)?
            .into_iter()
            .map(ChunkInput::into_chunk)
            .collect::<Result<Vec<_>>>()?;
        let outcome = engine.scan(&chunks, &args.attribute)?;
        println!("{}", formatter.format_scan(&outcome)?);
        return Ok(());
    }

    let path = args
        .claims
        .as_deref()
        .ok_or_else(|| CliError::InvalidInput("Must specify --claims or --chunks".to_string()))?;
    let claims: Vec<Claim> = read_json(path)?;
    let consensus = engine.consensus(&args.attribute, &claims);
    println!("{}", formatter.format_consensus(&consensus)?);
    Ok(())
}

/// Source chunk as written by hand: the domain may come from a URL.
#[derive(Debug, Deserialize)]
struct ChunkInput {
    source_id: String,
    #[serde(default)]
    source_domain: Option<String>,
    #[serde(default)]
    url: Option<String>,
    text: String,
}

impl ChunkInput {
    fn into_chunk(self) -> Result<SourceChunk> {
        let source_domain = match (self.source_domain, self.url) {
            (Some(domain), _) => domain,
            (None, Some(url)) => source_domain(&url),
            (None, None) => {
                return Err(CliError::InvalidInput(format!(
                    "chunk {} needs a source_domain or url",
                    self.source_id
                )))
            }
        };
        Ok(SourceChunk {
            source_id: self.source_id,
            source_domain,
            text: self.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_url() {
        let input: ChunkInput = serde_json::from_str(
            r#"{"source_id": "c1", "url": "https://www.who.int/about", "text": "..."}"#,
        )
        .unwrap();
        assert_eq!(input.into_chunk().unwrap().source_domain, "who.int");
    }

    #[test]
    fn test_explicit_domain_wins() {
        let input: ChunkInput = serde_json::from_str(
            r#"{"source_id": "c1", "source_domain": "a.org", "url": "https://b.org", "text": ""}"#,
        )
        .unwrap();
        assert_eq!(input.into_chunk().unwrap().source_domain, "a.org");
    }

    #[test]
    fn test_chunk_without_domain_is_rejected() {
        let input: ChunkInput =
            serde_json::from_str(r#"{"source_id": "c1", "text": ""}"#).unwrap();
        assert!(matches!(input.into_chunk(), Err(CliError::InvalidInput(_))));
    }
}
