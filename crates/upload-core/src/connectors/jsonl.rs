use crate::{
    connectors::source::{RecordSource, SubStore},
    error::SourceError,
};
use async_trait::async_trait;
use record_model::records::record::Record;
use serde::de::DeserializeOwned;
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
};
use tracing::debug;

/// Reads records from JSON-lines files, one file per sub-store.
///
/// Pages are produced by re-reading the file and skipping `offset` records,
/// so at most one page is held in memory. Blank lines are ignored.
pub struct JsonLinesSource<R> {
    stores: Vec<SubStore>,
    paths: Vec<PathBuf>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> JsonLinesSource<R> {
    /// Sub-stores are named after the file stem, in the order given.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        let stores = paths
            .iter()
            .map(|path| {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                SubStore::new(name)
            })
            .collect();

        Self {
            stores,
            paths,
            _marker: PhantomData,
        }
    }

    fn path(&self, sub_store: usize) -> Result<&Path, SourceError> {
        self.paths
            .get(sub_store)
            .map(PathBuf::as_path)
            .ok_or(SourceError::UnknownSubStore(sub_store))
    }
}

async fn open_lines(path: &Path) -> Result<Lines<BufReader<File>>, SourceError> {
    let file = File::open(path).await.map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file).lines())
}

#[async_trait]
impl<R> RecordSource<R> for JsonLinesSource<R>
where
    R: Record + DeserializeOwned,
{
    fn sub_stores(&self) -> &[SubStore] {
        &self.stores
    }

    async fn count(&self) -> Result<u64, SourceError> {
        let mut total = 0u64;

        for path in &self.paths {
            let mut lines = open_lines(path).await?;
            while let Some(line) = lines.next_line().await.map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })? {
                if !line.trim().is_empty() {
                    total += 1;
                }
            }
        }

        Ok(total)
    }

    async fn fetch_page(
        &self,
        sub_store: usize,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<R>, SourceError> {
        let path = self.path(sub_store)?;
        let mut lines = open_lines(path).await?;
        let mut page = Vec::with_capacity(limit.min(4096));
        let mut seen = 0u64;
        let mut line_no = 0usize;

        while page.len() < limit {
            let Some(line) = lines.next_line().await.map_err(|source| SourceError::Io {
                path: path.to_path_buf(),
                source,
            })?
            else {
                break;
            };
            line_no += 1;

            if line.trim().is_empty() {
                continue;
            }
            if seen < offset {
                seen += 1;
                continue;
            }

            let record = serde_json::from_str(&line).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                source,
            })?;
            page.push(record);
        }

        debug!(
            path = %path.display(),
            offset,
            records = page.len(),
            "Read page from file"
        );
        Ok(page)
    }
}
