use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::decode::decode_image_file,
    config::Config,
    foundation::error::{ThumbError, ThumbResult},
    lifecycle::{ConversionJob, Disposal, finalize},
    render::transform::transform,
    scan::list_eligible,
};

/// Result of one conversion attempt.
#[derive(Debug)]
pub enum JobOutcome {
    /// The thumbnail was written; `disposal` says what happened to the source.
    Converted {
        /// Source file.
        source: PathBuf,
        /// Written thumbnail.
        output: PathBuf,
        /// Delete / archive result.
        disposal: Disposal,
    },
    /// Nothing was written and the source was left in place.
    Skipped {
        /// Source file.
        source: PathBuf,
        /// Why the job stopped.
        error: ThumbError,
    },
}

impl JobOutcome {
    /// `true` when a thumbnail was written.
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    /// Source path this outcome belongs to.
    pub fn source(&self) -> &Path {
        match self {
            Self::Converted { source, .. } | Self::Skipped { source, .. } => source,
        }
    }

    /// Log one line per notable event of this outcome.
    pub fn report(&self) {
        match self {
            Self::Converted {
                source,
                output,
                disposal,
            } => {
                tracing::info!(source = %source.display(), output = %output.display(), "converted");
                match disposal {
                    Disposal::Deleted => {
                        tracing::info!(source = %source.display(), "deleted original");
                    }
                    Disposal::Archived(dest) => {
                        tracing::info!(
                            source = %source.display(),
                            backup = %dest.display(),
                            "moved original to backup"
                        );
                    }
                    Disposal::Failed(error) => {
                        tracing::warn!(source = %source.display(), error = %error, "original kept");
                    }
                }
            }
            Self::Skipped { source, error } => {
                tracing::warn!(source = %source.display(), error = %error, "skipped");
            }
        }
    }
}

/// Decode, transform and finalize single files with a shared configuration.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: Arc<Config>,
}

impl Pipeline {
    /// Build a pipeline over a validated configuration.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Configuration this pipeline runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert `source` and retire it. Never panics on bad input; every failure
    /// is folded into [`JobOutcome::Skipped`].
    ///
    /// Returns `None` when `source` is no longer a regular file, e.g. because an
    /// earlier job already converted and removed it.
    #[tracing::instrument(skip(self, source), fields(source = %source.display()))]
    pub fn run(&self, source: &Path) -> Option<JobOutcome> {
        if !source.is_file() {
            tracing::debug!("source vanished before conversion");
            return None;
        }
        Some(match self.convert(source) {
            Ok((output, disposal)) => JobOutcome::Converted {
                source: source.to_path_buf(),
                output,
                disposal,
            },
            Err(error) => JobOutcome::Skipped {
                source: source.to_path_buf(),
                error,
            },
        })
    }

    fn convert(&self, source: &Path) -> ThumbResult<(PathBuf, Disposal)> {
        let cfg = &self.config;
        let job = ConversionJob::new(source, &cfg.output_dir)?;

        let decoded = decode_image_file(&job.source)?;
        let thumb = transform(&decoded, cfg.target, cfg.corner_radius, cfg.border())?;
        drop(decoded);

        let disposal = finalize(&job, &thumb, &cfg.disposal_policy())?;
        Ok((job.output, disposal))
    }

    /// Convert every eligible file already sitting in the input directory, in order.
    pub fn convert_existing(&self) -> ThumbResult<Vec<JobOutcome>> {
        let files = list_eligible(&self.config.input_dir, &self.config.valid_extensions)?;
        if files.is_empty() {
            tracing::info!(
                input = %self.config.input_dir.display(),
                "input folder is empty; drop files here to convert automatically"
            );
        }
        Ok(files
            .iter()
            .filter_map(|path| self.run(path))
            .inspect(JobOutcome::report)
            .collect())
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline/pipeline.rs"]
mod tests;
