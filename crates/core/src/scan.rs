use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::classify::Classifier;
use crate::model::{
    Blob, ClassificationReport, ClassificationResult, ExcludedBlob, ExclusionCount, ScanMetadata,
    ScanMetrics, SectionGroup, REPORT_VERSION,
};

const PROGRESS_EVERY_BLOBS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub max_depth: Option<usize>,
    pub excludes: Vec<String>,
    pub scan_id: Option<String>,
    pub config: Option<String>,
    pub progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_depth: None,
            excludes: Vec::new(),
            scan_id: None,
            config: None,
            progress: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct WalkOutput {
    pub blobs: Vec<Blob>,
    pub scanned_directories: u64,
}

pub fn collect_blobs(options: &ScanOptions, warnings: &mut Vec<String>) -> Result<WalkOutput> {
    let root = options.root.as_path();
    if !root.is_dir() {
        return Err(anyhow!(
            "partition root {} is not a directory",
            root.display()
        ));
    }

    let excludes = ExcludeMatcher::new(&options.excludes, warnings);
    let mut output = WalkOutput::default();

    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }
    let iter = walker.into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        !excludes.is_excluded(relative)
    });

    for item in iter {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                warn!("walk error under {}: {}", root.display(), err);
                warnings.push(format!("walk error under {}: {}", root.display(), err));
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        if entry.file_type().is_dir() {
            output.scanned_directories += 1;
            continue;
        }

        match Blob::from_path(root, entry.path()) {
            Ok(blob) => output.blobs.push(blob),
            Err(err) => {
                warn!("skipping {}: {}", entry.path().display(), err);
                warnings.push(format!("skipped {}: {}", entry.path().display(), err));
                continue;
            }
        }

        if options.progress && (output.blobs.len() as u64) % PROGRESS_EVERY_BLOBS == 0 {
            info!(
                "walk progress: {} blob(s) under {}",
                output.blobs.len(),
                root.display()
            );
        }
    }

    Ok(output)
}

pub fn run_classification(
    options: &ScanOptions,
    classifier: &Classifier,
) -> Result<ClassificationReport> {
    let started = Instant::now();
    let mut warnings = Vec::new();
    let walk = collect_blobs(options, &mut warnings)?;

    let mut report = classify_blobs(classifier, &walk.blobs);
    report.scan_id = options
        .scan_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    report.scan = ScanMetadata {
        root: options.root.to_string_lossy().to_string(),
        max_depth: options.max_depth,
        excludes: options.excludes.clone(),
        config: options.config.clone(),
    };
    report.metrics.scanned_directories = walk.scanned_directories;
    report.metrics.elapsed_ms = started.elapsed().as_millis() as u64;
    report.warnings.extend(warnings);

    info!(
        "classified {} blob(s) under {}: {} categorized, {} uncategorized, {} excluded",
        report.metrics.scanned_files,
        options.root.display(),
        report.metrics.categorized,
        report.metrics.uncategorized,
        report.metrics.excluded
    );
    Ok(report)
}

pub fn classify_blobs(classifier: &Classifier, blobs: &[Blob]) -> ClassificationReport {
    let registry = classifier.registry();
    let mut groups = registry
        .sections()
        .iter()
        .map(|section| SectionGroup {
            name: section.name().to_string(),
            blobs: Vec::new(),
        })
        .collect::<Vec<_>>();

    let mut metrics = ScanMetrics::default();
    let mut uncategorized = Vec::new();
    let mut excluded = Vec::new();
    let mut rule_counts: BTreeMap<&'static str, u64> = BTreeMap::new();

    for blob in blobs {
        metrics.scanned_files += 1;
        match classifier.classify_file(blob) {
            ClassificationResult::Excluded(rule) => {
                debug!(blob = blob.path(), rule = %rule, "excluded");
                metrics.excluded += 1;
                *rule_counts.entry(rule.label()).or_insert(0) += 1;
                excluded.push(ExcludedBlob {
                    path: blob.path().to_string(),
                    rule,
                });
            }
            ClassificationResult::Categorized(section) => {
                debug!(blob = blob.path(), section = section.name(), "categorized");
                metrics.categorized += 1;
                if let Some(index) = registry.index_of(section) {
                    groups[index].blobs.push(blob.path().to_string());
                }
            }
            ClassificationResult::Uncategorized => {
                metrics.uncategorized += 1;
                uncategorized.push(blob.path().to_string());
            }
        }
    }

    for group in &mut groups {
        group.blobs.sort();
    }
    groups.retain(|group| !group.blobs.is_empty());
    uncategorized.sort();
    excluded.sort_by(|a, b| a.path.cmp(&b.path));

    ClassificationReport {
        report_version: REPORT_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        scan_id: "unknown".to_string(),
        scan: ScanMetadata {
            root: String::new(),
            max_depth: None,
            excludes: Vec::new(),
            config: None,
        },
        metrics,
        sections: groups,
        uncategorized,
        excluded,
        exclusion_counts: rule_counts
            .into_iter()
            .map(|(rule, blobs)| ExclusionCount {
                rule: rule.to_string(),
                blobs,
            })
            .collect(),
        warnings: Vec::new(),
    }
}

struct ExcludeMatcher {
    globs: GlobSet,
    fragments: Vec<String>,
}

impl ExcludeMatcher {
    fn new(patterns: &[String], warnings: &mut Vec<String>) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut fragments = Vec::new();
        for pattern in patterns.iter().map(|pattern| pattern.trim()) {
            if pattern.is_empty() {
                continue;
            }
            if !has_glob_syntax(pattern) {
                fragments.push(pattern.to_string());
                continue;
            }
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    warn!("exclude '{}' is not a valid glob: {}", pattern, err);
                    warnings.push(format!(
                        "exclude '{pattern}' is not a valid glob ({err}); matching it as a path fragment"
                    ));
                    fragments.push(pattern.to_string());
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|err| {
            warnings.push(format!("exclude globs disabled: {err}"));
            GlobSet::empty()
        });
        Self { globs, fragments }
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        if self.globs.is_match(relative) {
            return true;
        }
        relative.to_str().is_some_and(|path| {
            self.fragments
                .iter()
                .any(|fragment| path.contains(fragment.as_str()))
        })
    }
}

fn has_glob_syntax(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', ']', '{', '}'])
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{classify_blobs, collect_blobs, run_classification, ExcludeMatcher, ScanOptions};
    use crate::classify::Classifier;
    use crate::ignore::IgnoreCatalog;
    use crate::model::{Blob, IgnoreRule};
    use crate::registry::SectionRegistryBuilder;
    use crate::section::Section;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, b"blob").expect("write blob");
    }

    #[test]
    fn excludes_partition_paths_by_glob_or_fragment() {
        let mut warnings = Vec::new();
        let matcher = ExcludeMatcher::new(
            &[
                "etc/{wifi,bluetooth}/**".to_string(),
                "lib64/hw/*.so".to_string(),
                " firmware ".to_string(),
                "etc/[acdb".to_string(),
                String::new(),
            ],
            &mut warnings,
        );

        assert!(matcher.is_excluded(Path::new("etc/wifi/WCNSS_qcom_cfg.ini")));
        assert!(matcher.is_excluded(Path::new("lib64/hw/camera.qcom.so")));
        assert!(matcher.is_excluded(Path::new("firmware/adsp.mdt")));
        assert!(matcher.is_excluded(Path::new("etc/firmware")));
        assert!(matcher.is_excluded(Path::new("etc/[acdb/MTP_Bluetooth_cal.acdb")));
        assert!(!matcher.is_excluded(Path::new("etc/wifi.conf")));
        assert!(!matcher.is_excluded(Path::new("lib64/libqti-perfd-client.so")));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("etc/[acdb"));
    }

    #[test]
    fn groups_follow_registry_positions_for_duplicate_names() {
        let mut builder = SectionRegistryBuilder::new();
        builder
            .register(Section::new("Audio").with_folders(["etc/acdbdata"]))
            .register(Section::new("Camera").with_folders(["etc/camera"]))
            .register(Section::new("Audio").with_folders(["etc/audio"]));
        let classifier = Classifier::new(IgnoreCatalog::default(), builder.build());

        let blobs = ["etc/camera/2.bin", "etc/acdbdata/1.acdb"].map(Blob::new);
        let report = classify_blobs(&classifier, &blobs);

        let groups = report
            .sections
            .iter()
            .map(|group| (group.name.as_str(), group.blobs.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            groups,
            [
                ("Audio", vec!["etc/acdbdata/1.acdb".to_string()]),
                ("Camera", vec!["etc/camera/2.bin".to_string()]),
            ]
        );
    }

    #[test]
    fn classifies_a_partition_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        for relative in [
            "bin/cat",
            "bin/hw/android.hardware.health@2.1-service",
            "bin/init.qcom.sh",
            "etc/dolby/dax-default.xml",
            "etc/selinux/vendor_sepolicy.cil",
            "etc/thermal-engine.conf",
            "lib64/libdeccfg.so",
            "lib64/hw/android.hardware.foo@1.0-service.so",
            "lib64/hw/android.hardware.foo@1.0-impl.so",
            "scratch/notes.tmp",
        ] {
            touch(root, relative);
        }

        let options = ScanOptions {
            root: root.to_path_buf(),
            excludes: vec!["**/*.tmp".to_string()],
            scan_id: Some("test-scan".to_string()),
            ..ScanOptions::default()
        };
        let report =
            run_classification(&options, &Classifier::android_default()).expect("scan runs");

        assert_eq!(report.scan_id, "test-scan");
        assert_eq!(report.metrics.scanned_files, 9);
        assert_eq!(report.metrics.excluded, 4);
        assert_eq!(report.metrics.categorized, 3);
        assert_eq!(report.metrics.uncategorized, 2);

        let names = report
            .sections
            .iter()
            .map(|group| group.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Dolby", "Health"]);
        assert_eq!(
            report.sections[0].blobs,
            ["etc/dolby/dax-default.xml", "lib64/libdeccfg.so"]
        );
        assert_eq!(
            report.uncategorized,
            [
                "etc/thermal-engine.conf",
                "lib64/hw/android.hardware.foo@1.0-impl.so"
            ]
        );
        assert!(report.excluded.iter().any(|blob| blob.path == "etc/selinux/vendor_sepolicy.cil"
            && blob.rule == IgnoreRule::Folder("etc/selinux".to_string())));
        assert!(report
            .exclusion_counts
            .iter()
            .any(|count| count.rule == "pattern" && count.blobs == 2));
    }

    #[test]
    fn respects_max_depth_and_rejects_missing_roots() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "top.conf");
        touch(dir.path(), "etc/nested/deep.conf");

        let mut warnings = Vec::new();
        let options = ScanOptions {
            root: dir.path().to_path_buf(),
            max_depth: Some(1),
            ..ScanOptions::default()
        };
        let walk = collect_blobs(&options, &mut warnings).expect("walk runs");
        assert_eq!(walk.blobs.len(), 1);
        assert_eq!(walk.blobs[0].path(), "top.conf");
        assert_eq!(walk.scanned_directories, 1);

        let missing = ScanOptions {
            root: dir.path().join("missing"),
            ..ScanOptions::default()
        };
        assert!(collect_blobs(&missing, &mut warnings).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn partition_symlinks_are_blobs_and_get_excluded() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "etc/a.conf");
        std::os::unix::fs::symlink(dir.path().join("etc"), dir.path().join("vendor"))
            .expect("symlink");

        let options = ScanOptions {
            root: dir.path().to_path_buf(),
            ..ScanOptions::default()
        };
        let report =
            run_classification(&options, &Classifier::android_default()).expect("scan runs");
        assert!(report
            .excluded
            .iter()
            .any(|blob| blob.path == "vendor" && blob.rule == IgnoreRule::Filename));
        assert_eq!(report.uncategorized, ["etc/a.conf"]);
    }
}
