//! Result download.
//!
//! Fetches every URL output of a SUCCEEDED job into an output directory and
//! writes a `workflow.result.json` manifest describing the local files.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use musicai_models::{
    extract_file_extension_from_url, extract_name_from_url, is_http_url, sanitize_file_name,
    DownloadManifest, Job, JobId, MANIFEST_FILE_NAME,
};

use crate::client::MusicAiClient;
use crate::config::NamingMode;
use crate::error::{ClientError, ClientResult};

/// Local path (relative to the output directory, `/`-separated) for a result.
pub fn local_file_name(result_name: &str, url: &str, mode: NamingMode) -> String {
    let name = sanitize_file_name(result_name);
    let named = || match extract_file_extension_from_url(url) {
        Some(ext) => format!("{}.{}", name, sanitize_file_name(&ext)),
        None => name.clone(),
    };
    let url_file = || extract_name_from_url(url).map(|f| sanitize_file_name(&f));

    match mode {
        NamingMode::ResultName => named(),
        NamingMode::UrlFilename => url_file().unwrap_or_else(named),
        NamingMode::FolderPerResult => {
            let file = url_file().unwrap_or_else(|| name.clone());
            format!("{}/{}", name, file)
        }
    }
}

/// Claim `relative` in `taken`, appending `-1`, `-2`, ... to the file stem
/// until the path is free.
fn claim_file_name(relative: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(relative.clone()) {
        return relative;
    }

    let (dir, file) = match relative.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, relative.as_str()),
    };
    let (stem, ext) = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file, None),
    };

    let mut n = 1u32;
    loop {
        let file = match ext {
            Some(ext) => format!("{}-{}.{}", stem, n, ext),
            None => format!("{}-{}", stem, n),
        };
        let candidate = match dir {
            Some(dir) => format!("{}/{}", dir, file),
            None => file,
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

async fn ensure_parent(path: &Path) -> ClientResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::io(parent, e))?;
        }
    }
    Ok(())
}

impl MusicAiClient {
    /// Download `url` into `dest`, creating parent directories as needed.
    ///
    /// The body is streamed to `<dest>.part` and renamed on success. Returns
    /// the number of bytes written.
    pub async fn download_file(&self, url: &str, dest: impl AsRef<Path>) -> ClientResult<u64> {
        let dest = dest.as_ref();
        ensure_parent(dest).await?;

        let tmp = partial_path(dest);
        let result = self
            .execute_request("download_file", async {
                // Result URLs are pre-signed; no API key.
                let response = self.http.get(url).send().await?;
                let mut response = Self::check_status(response, url).await?;

                let mut file = tokio::fs::File::create(&tmp)
                    .await
                    .map_err(|e| ClientError::io(&tmp, e))?;
                let mut written = 0u64;
                while let Some(chunk) = response.chunk().await? {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| ClientError::io(&tmp, e))?;
                    written += chunk.len() as u64;
                }
                file.flush().await.map_err(|e| ClientError::io(&tmp, e))?;
                Ok(written)
            })
            .await;

        let written = match result {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|e| ClientError::io(dest, e))?;

        debug!(path = %dest.display(), bytes = written, "Downloaded file");
        Ok(written)
    }

    /// Download all URL results of a SUCCEEDED job using the configured naming mode.
    pub async fn download_job_results(
        &self,
        job: &Job,
        output_dir: impl AsRef<Path>,
    ) -> ClientResult<BTreeMap<String, PathBuf>> {
        self.download_job_results_with(job, output_dir, self.config().naming_mode)
            .await
    }

    /// Fetch the job, then download its results.
    pub async fn download_job_results_by_id(
        &self,
        job_id: &JobId,
        output_dir: impl AsRef<Path>,
    ) -> ClientResult<BTreeMap<String, PathBuf>> {
        let job = self.get_job(job_id).await?;
        self.download_job_results(&job, output_dir).await
    }

    /// Download all URL results of a SUCCEEDED job.
    ///
    /// Returns result name -> local path for every downloaded output. Literal
    /// outputs only appear in the manifest. Names that collide with each other
    /// or with the manifest get a numeric suffix. The first failing download
    /// aborts the call.
    pub async fn download_job_results_with(
        &self,
        job: &Job,
        output_dir: impl AsRef<Path>,
        mode: NamingMode,
    ) -> ClientResult<BTreeMap<String, PathBuf>> {
        if !job.is_succeeded() {
            return Err(ClientError::invalid_state(format!(
                "job {} is {}; results are only available for SUCCEEDED jobs",
                job.id, job.status
            )));
        }

        let output_dir = output_dir.as_ref();
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ClientError::io(output_dir, e))?;

        let mut manifest = DownloadManifest::new();
        let mut local_paths = BTreeMap::new();
        let mut taken = HashSet::from([MANIFEST_FILE_NAME.to_string()]);

        for (name, value) in &job.result {
            match value {
                Value::String(url) if is_http_url(url) => {
                    let relative = claim_file_name(local_file_name(name, url, mode), &mut taken);
                    let dest = output_dir.join(&relative);
                    self.download_file(url, &dest).await?;
                    manifest.insert_local(name.clone(), relative);
                    local_paths.insert(name.clone(), dest);
                }
                other => manifest.insert_value(name.clone(), other.clone()),
            }
        }

        let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
        let body = serde_json::to_vec_pretty(&manifest)?;
        tokio::fs::write(&manifest_path, body)
            .await
            .map_err(|e| ClientError::io(&manifest_path, e))?;

        info!(
            job_id = %job.id,
            files = local_paths.len(),
            output_dir = %output_dir.display(),
            "Job results downloaded"
        );
        Ok(local_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_name_result_name_mode() {
        assert_eq!(
            local_file_name("vocals", "https://cdn.example.com/x/abc123.wav?sig=1", NamingMode::ResultName),
            "vocals.wav"
        );
        assert_eq!(
            local_file_name("notes", "https://cdn.example.com/x/raw", NamingMode::ResultName),
            "notes"
        );
    }

    #[test]
    fn test_local_file_name_url_filename_mode() {
        assert_eq!(
            local_file_name("vocals", "https://cdn.example.com/x/My%20Vocals.wav", NamingMode::UrlFilename),
            "My Vocals.wav"
        );
        assert_eq!(
            local_file_name("stem", "https://cdn.example.com/", NamingMode::UrlFilename),
            "stem"
        );
    }

    #[test]
    fn test_local_file_name_folder_per_result_mode() {
        assert_eq!(
            local_file_name("vocals", "https://cdn.example.com/x/My.wav", NamingMode::FolderPerResult),
            "vocals/My.wav"
        );
        assert_eq!(
            local_file_name("stem", "https://cdn.example.com/", NamingMode::FolderPerResult),
            "stem/stem"
        );
    }

    #[test]
    fn test_claim_file_name_avoids_manifest_and_duplicates() {
        let mut taken = HashSet::from([MANIFEST_FILE_NAME.to_string()]);

        assert_eq!(claim_file_name("a.wav".into(), &mut taken), "a.wav");
        assert_eq!(claim_file_name("a.wav".into(), &mut taken), "a-1.wav");
        assert_eq!(claim_file_name("a.wav".into(), &mut taken), "a-2.wav");
        assert_eq!(
            claim_file_name(MANIFEST_FILE_NAME.into(), &mut taken),
            "workflow.result-1.json"
        );
        assert_eq!(claim_file_name("notes".into(), &mut taken), "notes");
        assert_eq!(claim_file_name("notes".into(), &mut taken), "notes-1");
        assert_eq!(claim_file_name("v/x.wav".into(), &mut taken), "v/x.wav");
        assert_eq!(claim_file_name("v/x.wav".into(), &mut taken), "v/x-1.wav");
        assert_eq!(claim_file_name(".wav".into(), &mut taken), ".wav");
        assert_eq!(claim_file_name(".wav".into(), &mut taken), ".wav-1");
    }

    #[test]
    fn test_local_file_name_sanitizes_result_name() {
        assert_eq!(
            local_file_name("../x", "https://cdn.example.com/a.mp3", NamingMode::ResultName),
            ".._x.mp3"
        );
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(partial_path(Path::new("/tmp/out/a.wav")), PathBuf::from("/tmp/out/a.wav.part"));
    }
}
