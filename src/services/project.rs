//! Project file loading and saving
//!
//! The project is a YAML file with the slot, the entity and intent
//! vocabulary, and the slot's list of slot-filling rules.

use crate::model::Project;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Project file not found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to access project file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse project file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub fn load_project(path: &Path) -> Result<Project, ProjectError> {
    if !path.exists() {
        return Err(ProjectError::NotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let project: Project = serde_yaml::from_str(&contents).map_err(|source| ProjectError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        slot = %project.slot.name,
        rules = project.slot_filling.len(),
        "project loaded"
    );
    Ok(project)
}

pub fn save_project(path: &Path, project: &Project) -> Result<(), ProjectError> {
    let contents = serde_yaml::to_string(project).map_err(|source| ProjectError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, contents).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), rules = project.slot_filling.len(), "project saved");
    Ok(())
}
