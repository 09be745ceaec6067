use crate::model::ClassificationReport;

const EXCLUDED_LISTING_LIMIT: usize = 50;

pub fn render_markdown_summary(report: &ClassificationReport) -> String {
    let mut out = String::new();
    out.push_str("# Blob Classification Summary\n\n");
    out.push_str(&format!(
        "- Report version: `{}`\n- Generated at: `{}`\n- Scan id: `{}`\n- Partition root: `{}`\n- Elapsed: `{} ms`\n\n",
        report.report_version,
        report.generated_at,
        report.scan_id,
        report.scan.root,
        report.metrics.elapsed_ms
    ));
    if let Some(config) = &report.scan.config {
        out.push_str(&format!("- Config: `{}`\n\n", config));
    }

    out.push_str(&format!(
        "## Totals\n\n- Blobs: {}\n- Directories: {}\n- Categorized: {}\n- Uncategorized: {}\n- Excluded: {}\n\n",
        report.metrics.scanned_files,
        report.metrics.scanned_directories,
        report.metrics.categorized,
        report.metrics.uncategorized,
        report.metrics.excluded
    ));

    out.push_str("## Sections\n\n");
    if report.sections.is_empty() {
        out.push_str("No blobs matched a section.\n\n");
    } else {
        for group in &report.sections {
            out.push_str(&format!("### {} ({})\n\n", group.name, group.blobs.len()));
            for blob in &group.blobs {
                out.push_str(&format!("- `{}`\n", blob));
            }
            out.push('\n');
        }
    }

    out.push_str("## Uncategorized\n\n");
    if report.uncategorized.is_empty() {
        out.push_str("Every kept blob belongs to a section.\n\n");
    } else {
        for blob in &report.uncategorized {
            out.push_str(&format!("- `{}`\n", blob));
        }
        out.push('\n');
    }

    out.push_str("## Exclusions\n\n");
    if report.excluded.is_empty() {
        out.push_str("No blobs were excluded.\n\n");
    } else {
        for count in &report.exclusion_counts {
            out.push_str(&format!("- `{}`: {} blob(s)\n", count.rule, count.blobs));
        }
        out.push('\n');
        for blob in report.excluded.iter().take(EXCLUDED_LISTING_LIMIT) {
            out.push_str(&format!("- `{}` ({})\n", blob.path, blob.rule));
        }
        if report.excluded.len() > EXCLUDED_LISTING_LIMIT {
            out.push_str(&format!(
                "- ... {} more\n",
                report.excluded.len() - EXCLUDED_LISTING_LIMIT
            ));
        }
        out.push('\n');
    }

    if !report.warnings.is_empty() {
        out.push_str("## Warnings\n\n");
        for warning in &report.warnings {
            out.push_str(&format!("- {}\n", warning));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::render_markdown_summary;
    use crate::classify::Classifier;
    use crate::model::Blob;
    use crate::scan::classify_blobs;

    #[test]
    fn lists_sections_uncategorized_and_exclusions() {
        let blobs = [
            "lib64/libdapparamstorage.so",
            "etc/thermal-engine.conf",
            "etc/selinux/vendor_sepolicy.cil",
        ]
        .map(Blob::new);
        let report = classify_blobs(&Classifier::android_default(), &blobs);

        let markdown = render_markdown_summary(&report);
        assert!(markdown.contains("### Dolby (1)"));
        assert!(markdown.contains("- `etc/thermal-engine.conf`"));
        assert!(markdown.contains("- `folder`: 1 blob(s)"));
        assert!(markdown.contains("(folder etc/selinux)"));
        assert!(!markdown.contains("## Warnings"));
    }
}
