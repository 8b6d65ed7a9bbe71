//! In-memory full-text index backed by tantivy

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tokio::sync::RwLock;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::index::{ScoredRecord, TextIndex, TextRecord};
use crate::domain::DomainError;

const CONTENT_TOKENIZER: &str = "content_lowercase";
const WRITER_MEMORY_BYTES: usize = 20_000_000;

/// Lowercased unicode words
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

fn backend_error(e: impl fmt::Display) -> DomainError {
    DomainError::backend(format!("text index: {}", e))
}

#[derive(Debug, Clone, Copy)]
struct Fields {
    id: Field,
    content: Field,
    metadata: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();

    let id = builder.add_text_field("id", STRING | STORED);
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(CONTENT_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let content = builder.add_text_field(
        "content",
        TextOptions::default().set_indexing_options(indexing).set_stored(),
    );
    let metadata = builder.add_text_field("metadata", STORED);

    (builder.build(), Fields { id, content, metadata })
}

fn register_tokenizer(index: &Index) {
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .build();
    index.tokenizers().register(CONTENT_TOKENIZER, analyzer);
}

/// One RAM index per collection, with a single long-lived writer
struct TextCollection {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: Fields,
}

impl TextCollection {
    fn create() -> Result<Self, DomainError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        register_tokenizer(&index);

        let writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .map_err(backend_error)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(backend_error)?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            fields,
        })
    }

    fn id_term(&self, id: &str) -> Term {
        Term::from_field_text(self.fields.id, id)
    }

    fn contains(&self, searcher: &Searcher, id: &str) -> Result<bool, DomainError> {
        let query = TermQuery::new(self.id_term(id), IndexRecordOption::Basic);
        searcher
            .search(&query, &Count)
            .map(|count| count > 0)
            .map_err(backend_error)
    }

    /// Commit and make the writes visible to the next searcher
    fn commit(&self, writer: &mut IndexWriter) -> Result<(), DomainError> {
        writer.commit().map_err(backend_error)?;
        self.reader.reload().map_err(backend_error)
    }

    /// Delete-then-add per id, so a record is replaced whole
    fn upsert(&self, records: Vec<TextRecord>) -> Result<usize, DomainError> {
        let prepared = records
            .into_iter()
            .map(|record| {
                serde_json::to_string(&record.metadata)
                    .map(|metadata| (record, metadata))
                    .map_err(backend_error)
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let written = prepared.len();

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        for (record, metadata) in prepared {
            writer.delete_term(self.id_term(&record.id));

            let added = writer.add_document(doc!(
                self.fields.id => record.id,
                self.fields.content => record.content,
                self.fields.metadata => metadata,
            ));

            if let Err(e) = added {
                writer.rollback().map_err(backend_error)?;
                return Err(backend_error(e));
            }
        }

        self.commit(&mut writer)?;
        Ok(written)
    }

    fn delete(&self, ids: &[String]) -> Result<usize, DomainError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let searcher = self.reader.searcher();

        let mut removed = 0;
        let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();

        for id in unique {
            if self.contains(&searcher, id)? {
                writer.delete_term(self.id_term(id));
                removed += 1;
            }
        }

        if removed > 0 {
            self.commit(&mut writer)?;
        }

        Ok(removed)
    }

    fn record(&self, doc: &TantivyDocument) -> Result<TextRecord, DomainError> {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let metadata = match doc.get_first(self.fields.metadata).and_then(|v| v.as_str()) {
            Some(raw) => serde_json::from_str(raw).map_err(backend_error)?,
            None => HashMap::new(),
        };

        Ok(TextRecord {
            id: text(self.fields.id),
            content: text(self.fields.content),
            metadata,
        })
    }

    fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredRecord>, DomainError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let (query, _ignored) = parser.parse_query_lenient(text);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(top_k))
            .map_err(backend_error)?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(backend_error)?;
            let record = self.record(&doc)?;

            hits.push(ScoredRecord {
                id: record.id,
                content: record.content,
                score,
                metadata: record.metadata,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(hits)
    }

    fn get(&self, id: &str) -> Result<Option<TextRecord>, DomainError> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(self.id_term(id), IndexRecordOption::Basic);

        let top = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(backend_error)?;

        match top.first() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher.doc(*address).map_err(backend_error)?;
                self.record(&doc).map(Some)
            }
            None => Ok(None),
        }
    }

    fn count(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }
}

/// BM25 full-text search over one tantivy RAM index per collection.
///
/// Records are keyed by an untokenized `id` field. Content is lowercased
/// and split on non-alphanumeric characters. Query syntax errors are
/// ignored; the parsable part of the query still runs.
#[derive(Default, Clone)]
pub struct InMemoryTextIndex {
    collections: Arc<RwLock<HashMap<String, Arc<TextCollection>>>>,
}

impl InMemoryTextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collection(&self, name: &str) -> Option<Arc<TextCollection>> {
        self.collections.read().await.get(name).cloned()
    }

    async fn collection_or_create(&self, name: &str) -> Result<Arc<TextCollection>, DomainError> {
        if let Some(existing) = self.collection(name).await {
            return Ok(existing);
        }

        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            return Ok(existing.clone());
        }

        let created = Arc::new(TextCollection::create()?);
        collections.insert(name.to_string(), created.clone());
        Ok(created)
    }
}

impl fmt::Debug for InMemoryTextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTextIndex").finish_non_exhaustive()
    }
}

#[async_trait]
impl TextIndex for InMemoryTextIndex {
    async fn upsert(&self, collection: &str, records: Vec<TextRecord>) -> Result<usize, DomainError> {
        let target = self.collection_or_create(collection).await?;

        tokio::task::spawn_blocking(move || target.upsert(records))
            .await
            .map_err(backend_error)?
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError> {
        let Some(target) = self.collection(collection).await else {
            return Ok(0);
        };
        let ids = ids.to_vec();

        tokio::task::spawn_blocking(move || target.delete(&ids))
            .await
            .map_err(backend_error)?
    }

    async fn query(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        match self.collection(collection).await {
            Some(target) => target.query(query, top_k),
            None => Ok(Vec::new()),
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<TextRecord>, DomainError> {
        match self.collection(collection).await {
            Some(target) => target.get(id),
            None => Ok(None),
        }
    }

    async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        Ok(self
            .collection(collection)
            .await
            .map(|target| target.count())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, content: &str) -> TextRecord {
        TextRecord {
            id: id.to_string(),
            content: content.to_string(),
            metadata: HashMap::new(),
        }
    }

    async fn seeded() -> InMemoryTextIndex {
        let index = InMemoryTextIndex::new();
        index
            .upsert(
                "docs",
                vec![
                    record("a", "Rust ownership and borrowing"),
                    record("b", "Ownership in Rust, ownership everywhere"),
                    record("c", "Baking sourdough bread"),
                ],
            )
            .await
            .unwrap();
        index
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Hello, World! it's"), vec!["hello", "world", "it's"]);
    }

    #[tokio::test]
    async fn test_query_ranks_matching_records() {
        let index = seeded().await;

        let hits = index.query("docs", "RUST ownership", 10).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits.iter().all(|h| h.score > 0.0));
        assert!(hits.iter().all(|h| h.id != "c"));
    }

    #[tokio::test]
    async fn test_query_respects_top_k() {
        let index = seeded().await;

        assert_eq!(index.query("docs", "rust", 1).await.unwrap().len(), 1);
        assert!(index.query("docs", "rust", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_match_and_missing_collection() {
        let index = seeded().await;

        assert!(index.query("docs", "quantum", 10).await.unwrap().is_empty());
        assert!(index.query("other", "rust", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_syntax_is_lenient() {
        let index = seeded().await;

        let hits = index.query("docs", "sourdough AND (", 10).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "c");
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = seeded().await;

        index
            .upsert("docs", vec![record("c", "Rust bread")])
            .await
            .unwrap();

        assert_eq!(index.count("docs").await.unwrap(), 3);
        assert_eq!(index.get("docs", "c").await.unwrap().unwrap().content, "Rust bread");
        assert!(index
            .query("docs", "sourdough", 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_metadata_round_trips() {
        let index = InMemoryTextIndex::new();
        let mut stored = record("m", "tagged text");
        stored
            .metadata
            .insert("source".to_string(), serde_json::json!("notes.txt"));

        index.upsert("docs", vec![stored]).await.unwrap();

        let hit = &index.query("docs", "tagged", 5).await.unwrap()[0];
        assert_eq!(hit.metadata.get("source"), Some(&serde_json::json!("notes.txt")));
    }

    #[tokio::test]
    async fn test_delete() {
        let index = seeded().await;

        let removed = index
            .delete(
                "docs",
                &["a".to_string(), "a".to_string(), "missing".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(index.count("docs").await.unwrap(), 2);
        assert!(index.get("docs", "a").await.unwrap().is_none());
        assert_eq!(index.delete("nowhere", &["a".to_string()]).await.unwrap(), 0);
    }
}
