//! Resolves a sequence accession to a cached local path, fetching it over HTTP on a
//! cache miss. Stands in for the original's BLAST-oriented `fetch_sequence`
//! procedure; invoking the `blastn`/`blastp` binaries themselves is out of scope.

use std::io::Write;

use orbql_core::registry::{Argument, ProcResult, Procedure, ProcedureQuery, Registry};
use orbql_core::OrbqlError;
use oxrdf::{Literal, NamedNode, Term};

const BASE: &str = "http://www.orbql.example/procedures/sequence_fetch/";
const ENDPOINT: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

fn fetch(accession: &str, query: &ProcedureQuery) -> Result<String, OrbqlError> {
    let dir = query.get_temp_dir()?;
    let path = dir.join(format!("{accession}.fasta"));
    let url = format!("{ENDPOINT}?db=nuccore&id={accession}&rettype=fasta&retmode=text");
    let body = ureq::get(&url)
        .call()
        .map_err(|e| OrbqlError::RequestMalformed(e.to_string()))?
        .into_string()
        .map_err(OrbqlError::Io)?;
    let mut file = std::fs::File::create(&path)?;
    file.write_all(body.as_bytes())?;
    Ok(path.to_string_lossy().into_owned())
}

/// Registers `fetch` under `http://www.orbql.example/procedures/sequence_fetch/`.
pub fn register(registry: &mut Registry) -> Result<(), OrbqlError> {
    let accession = Argument::new("accession").with_description("a GenBank nucleotide accession");
    let path = Argument::new("path").with_description("local FASTA file path for the fetched sequence");
    let procedure = Procedure::new(
        NamedNode::new_unchecked(format!("{BASE}fetch")),
        |inputs, _outputs, query| {
            let Some(Term::Literal(accession)) = inputs.get("accession") else {
                return Err(OrbqlError::RequestMalformed("missing accession".to_string()));
            };
            let path = fetch(accession.value(), query)?;
            Ok(ProcResult::Scalar(Literal::new_simple_literal(path).into()))
        },
    )
    .with_accepts([accession.clone()])
    .with_requires([accession])
    .with_generates([path])
    .with_author("orbql")
    .with_description("fetches a nucleotide sequence by accession into a temporary FASTA file")
    .with_provenance("NCBI Entrez eutils");
    registry.register(procedure)
}
