//! Deterministic sample selection (SPEC_FULL.md §4.13, §8 invariant 5):
//! sort `.bin` filenames in the recording directory as integers, then slice
//! `[start:finish:step]`. Grounded on
//! `original_source/src/tools/data_generation/utils.py`'s
//! `get_sample_list`/`sort_records` and
//! `generate_data.py`'s `MultiprocessDataGenerator::_get_subsample`.

use crate::error::{Error, Result};
use std::path::Path;

/// Lists every `{N}.bin` record id present in `recording_dir`, sorted
/// numerically (not lexically — `"10"` sorts after `"9"`).
pub fn list_record_ids(recording_dir: &Path) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(recording_dir).map_err(|source| Error::ReadRecordingDir {
        path: recording_dir.to_path_buf(),
        source,
    })? {
        let entry = entry.map_err(|source| Error::ReadRecordingDir {
            path: recording_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("bin") {
            continue;
        }
        if let Some(id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Slices the sorted id list `[start:finish:step]`, `finish=None` meaning
/// "through the end" (SPEC_FULL.md §6 `finish_at_sample`).
pub fn select_samples(ids: &[u64], start: usize, finish: Option<usize>, step: usize) -> Vec<u64> {
    let end = finish.unwrap_or(ids.len()).min(ids.len());
    let step = step.max(1);
    if start >= end {
        return Vec::new();
    }
    ids[start..end].iter().step_by(step).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_and_sorts_numerically_not_lexically() {
        let dir = tempfile::tempdir().unwrap();
        for n in [2, 10, 1, 20] {
            std::fs::write(dir.path().join(format!("{n}.bin")), b"").unwrap();
            std::fs::write(dir.path().join(format!("{n}.jpeg")), b"").unwrap();
        }
        let ids = list_record_ids(dir.path()).unwrap();
        assert_eq!(ids, vec![1, 2, 10, 20]);
    }

    #[test]
    fn select_samples_applies_start_finish_step() {
        let ids: Vec<u64> = (0..10).collect();
        assert_eq!(select_samples(&ids, 2, Some(8), 3), vec![2, 5]);
        assert_eq!(select_samples(&ids, 0, None, 1), ids);
        assert_eq!(select_samples(&ids, 9, Some(3), 1), Vec::<u64>::new());
    }
}
