use std::collections::BTreeSet;

use log::info;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::core::{
    http::{
        ensure_success,
        http_client,
    },
    KanjiItem,
    Reading,
    ReadingKind,
    StudyError,
};

/// Request-size limit of the batch subjects endpoint.
pub const BATCH_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
struct Pages {
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssignmentsPage {
    pages: Pages,
    data: Vec<AssignmentEnvelope>,
}

#[derive(Debug, Deserialize)]
struct AssignmentEnvelope {
    data: AssignmentData,
}

#[derive(Debug, Deserialize)]
struct AssignmentData {
    subject_id: u64,
}

#[derive(Debug, Deserialize)]
struct SubjectsPage {
    data: Vec<SubjectEnvelope>,
}

#[derive(Debug, Deserialize)]
struct SubjectEnvelope {
    id: u64,
    object: String,
    data: SubjectData,
}

#[derive(Debug, Deserialize)]
struct SubjectData {
    characters: Option<String>,
    #[serde(default)]
    meanings: Vec<MeaningEntry>,
    #[serde(default)]
    readings: Vec<ReadingEntry>,
}

#[derive(Debug, Deserialize)]
struct MeaningEntry {
    meaning: String,
}

#[derive(Debug, Deserialize)]
struct ReadingEntry {
    reading: String,
    #[serde(rename = "type")]
    kind: ReadingKind,
}

pub struct WaniKaniClient {
    client: Client,
    base_url: String,
    token: String,
}

impl WaniKaniClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, StudyError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, StudyError> {
        let resp = self.client.get(url).bearer_auth(&self.token).send()?;
        ensure_success(&resp)?;
        Ok(resp.json::<T>()?)
    }

    /// Phase one: walk the paginated assignments listing and collect every
    /// kanji subject id, duplicate-free.
    pub fn list_kanji_subject_ids(&self) -> Result<Vec<u64>, StudyError> {
        let mut ids = BTreeSet::new();
        let mut url = Some(format!("{}/assignments?subject_types=kanji", self.base_url));
        let mut pages = 0usize;

        while let Some(next) = url {
            let page: AssignmentsPage = self.get_json(&next)?;
            pages += 1;
            ids.extend(page.data.iter().map(|a| a.data.subject_id));
            url = page.pages.next_url;
        }

        info!("enumerated {} kanji subjects across {} pages", ids.len(), pages);
        Ok(ids.into_iter().collect())
    }

    /// Phase two: resolve ids to full subjects, chunked to respect the
    /// request-size limit, keeping only kanji records.
    pub fn fetch_subjects(&self, ids: &[u64]) -> Result<Vec<KanjiItem>, StudyError> {
        let mut items = Vec::with_capacity(ids.len());
        let chunks = chunk_id_params(ids);
        let requests = chunks.len();
        for joined in chunks {
            let url = format!("{}/subjects?ids={}", self.base_url, joined);
            let page: SubjectsPage = self.get_json(&url)?;
            items.extend(page.data.into_iter().filter_map(project_subject));
        }
        info!("resolved {} kanji subjects in {} batch requests", items.len(), requests);
        Ok(items)
    }
}

/// Comma-joined id parameters, one per batch request.
fn chunk_id_params(ids: &[u64]) -> Vec<String> {
    ids.chunks(BATCH_SIZE)
        .map(|chunk| chunk.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(","))
        .collect()
}

/// Keep only kanji records and project them into the cached shape. All
/// meanings are retained, readings keep their kind tag.
fn project_subject(subject: SubjectEnvelope) -> Option<KanjiItem> {
    if subject.object != "kanji" {
        return None;
    }
    let data = subject.data;
    Some(KanjiItem {
        id: subject.id,
        characters: data.characters,
        meanings: data.meanings.into_iter().map(|m| m.meaning).collect(),
        readings: data
            .readings
            .into_iter()
            .map(|r| Reading { reading: r.reading, kind: r.kind })
            .collect(),
    })
}
