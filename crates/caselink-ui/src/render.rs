//! Text renderers for dashboard panels.

use caselink_core::{Finding, ReportResponse, image_path};
use caselink_findings::Query;
use thiserror::Error;
use tracing::error;

use crate::catalog::Catalog;
use crate::{DashboardView, ToastLevel};

/// Link shown in the external resources panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalResource {
    /// Display name.
    pub name: &'static str,
    /// Destination URL.
    pub url: &'static str,
    /// Short description.
    pub description: &'static str,
}

/// Resources listed on every dashboard.
pub const DEFAULT_RESOURCES: [ExternalResource; 3] = [
    ExternalResource {
        name: "National Cancer Institute (NCI)",
        url: "https://www.cancer.gov/",
        description: "The U.S. National Cancer Institute: authoritative information on cancer types, treatment, research, and prevention.",
    },
    ExternalResource {
        name: "American Cancer Society (ACS)",
        url: "https://www.cancer.org/",
        description: "The American Cancer Society: patient support, education, and advocacy.",
    },
    ExternalResource {
        name: "Mayo Clinic - Cancer Center",
        url: "https://www.mayoclinic.org/cancer-center/",
        description: "Mayo Clinic Cancer Center: information on cancer diagnosis, treatment, and research from a leading medical center.",
    },
];

/// Results section could not be rendered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Annotation geometry is not finite or has negative size.
    #[error("finding {finding_id} has malformed annotation #{index}")]
    InvalidAnnotation {
        /// Finding carrying the annotation.
        finding_id: String,
        /// Annotation position.
        index: usize,
    },
    /// Report response carried an empty URL.
    #[error("report url is empty")]
    EmptyReportUrl,
}

/// Human-readable byte size (`50 MB`, `512 KB`, `12 B`).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    match bytes {
        b if b >= MB && b % MB == 0 => format!("{} MB", b / MB),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{} KB", b / KB),
        b => format!("{b} B"),
    }
}

/// Renders the whole dashboard for the current phase.
pub fn render_dashboard(view: &DashboardView, catalog: &Catalog) -> String {
    let mut sections = vec![format!("== {} ==", catalog.text("dashboard.title"))];

    if view.shows_loading() {
        sections.push(format!("… {}", catalog.text("common.loading")));
        return sections.join("\n\n");
    }

    if view.shows_invalid_notice() {
        sections.push(format!(
            "✖ {}\n  {}",
            catalog.text("dashboard.access_link_invalid"),
            catalog.text("dashboard.access_link_expired_message")
        ));
        return sections.join("\n\n");
    }

    sections.push(render_disclaimer(catalog));

    if view.shows_upload_widget() {
        sections.push(render_upload_panel(view, catalog));
    }

    if view.shows_processing() {
        sections.push(format!(
            "… {} ({})",
            catalog.text("dashboard.processing_documents"),
            catalog.text("common.loading")
        ));
    }

    for fetch_error in [view.findings.error(), view.report.error()].into_iter().flatten() {
        sections.push(format!("✖ {}: {}", catalog.text("common.error"), fetch_error.message()));
    }

    if view.shows_results() {
        let results = render_results(view, catalog).unwrap_or_else(|render_error| {
            error!(error = %render_error, "results section failed to render");
            format!(
                "✖ {}: {}",
                catalog.text("common.error"),
                catalog.text("dashboard.ai_unavailable_contingency")
            )
        });
        sections.push(results);
    }

    sections.push(render_external_resources(&DEFAULT_RESOURCES, catalog));

    if !view.toasts.is_empty() {
        let toasts: Vec<String> = view
            .toasts
            .iter()
            .map(|toast| match toast.level {
                ToastLevel::Success => format!("✔ {}", toast.message),
                ToastLevel::Error => format!("✖ {}", toast.message),
            })
            .collect();
        sections.push(toasts.join("\n"));
    }

    sections.push(format!("caselink {}", view.version));
    sections.join("\n\n")
}

/// Renders findings summary, image viewers, and report preview.
///
/// # Errors
/// Returns [`RenderError`] when a finding or the report cannot be displayed.
pub fn render_results(view: &DashboardView, catalog: &Catalog) -> Result<String, RenderError> {
    let findings = view.findings.data().map(Vec::as_slice).unwrap_or_default();
    let mut sections = vec![render_findings_summary(findings, catalog)];

    for finding in view.viewer_targets() {
        sections.push(render_image_viewer(finding, catalog)?);
    }

    match &view.report {
        Query::Loading => sections.push(format!("… {}", catalog.text("common.loading"))),
        Query::Ready(report) => sections.push(render_report_preview(report, catalog)?),
        Query::Idle | Query::Failed(_) => {}
    }

    Ok(sections.join("\n\n"))
}

/// Renders the upload panel.
pub fn render_upload_panel(view: &DashboardView, catalog: &Catalog) -> String {
    let mut lines = vec![
        format!("[{}]", catalog.text("upload.title")),
        catalog.text("upload.instructions"),
    ];
    for kind in ["cxr", "ct", "petct", "pathology", "radiology", "lab"] {
        lines.push(format!("  • {}", catalog.text(&format!("upload.{kind}"))));
    }
    lines.push(catalog.text("upload.allowedTypes"));
    let max_size = format_size(view.max_file_size);
    lines.push(catalog.format("upload.maxSize", &[("size", max_size.as_str())]));

    if !view.files.is_empty() {
        lines.push(format!("{}:", catalog.text("upload.uploadedFiles")));
        for (index, file) in view.files.iter().enumerate() {
            lines.push(format!("  {}. {} ({})", index + 1, file.name, format_size(file.size)));
        }
    }

    let checkbox = if view.disclaimer_accepted { "[x]" } else { "[ ]" };
    lines.push(format!("{checkbox} {}", catalog.text("upload.disclaimer")));
    lines.join("\n")
}

/// Renders the findings list, or the empty state.
pub fn render_findings_summary(findings: &[Finding], catalog: &Catalog) -> String {
    if findings.is_empty() {
        return format!(
            "[{}]\n{}",
            catalog.text("dashboard.findings_empty_title"),
            catalog.text("dashboard.no_findings")
        );
    }

    let mut lines = vec![format!("[{}]", catalog.text("dashboard.findings_title"))];
    for finding in findings {
        lines.push(format!("  ({}) {}", finding.source, finding.description));
        if let Some(location) = &finding.location {
            lines.push(format!(
                "      {}",
                catalog.format("dashboard.location", &[("location", location.as_str())])
            ));
        }
    }
    lines.join("\n")
}

/// Renders one image viewer with its annotation boxes.
///
/// # Errors
/// Returns [`RenderError::InvalidAnnotation`] for malformed geometry.
pub fn render_image_viewer(finding: &Finding, catalog: &Catalog) -> Result<String, RenderError> {
    let path = image_path(&finding.file_id);
    let mut lines = vec![catalog.format("dashboard.image_viewer", &[("path", path.as_str())])];

    for (index, annotation) in finding.annotations().iter().enumerate() {
        if !annotation.is_well_formed() {
            return Err(RenderError::InvalidAnnotation {
                finding_id: finding.finding_id.clone(),
                index,
            });
        }
        let (x, y) = (annotation.x.to_string(), annotation.y.to_string());
        let (width, height) = (annotation.width.to_string(), annotation.height.to_string());
        let mut line = format!(
            "  ▭ {}",
            catalog.format(
                "dashboard.annotation",
                &[
                    ("x", x.as_str()),
                    ("y", y.as_str()),
                    ("width", width.as_str()),
                    ("height", height.as_str()),
                ],
            )
        );
        if let Some(label) = &annotation.label {
            line.push_str(&format!(" \"{label}\""));
        }
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

/// Renders the report location and download action.
///
/// # Errors
/// Returns [`RenderError::EmptyReportUrl`] when the URL is blank.
pub fn render_report_preview(report: &ReportResponse, catalog: &Catalog) -> Result<String, RenderError> {
    let url = report.report_url.trim();
    if url.is_empty() {
        return Err(RenderError::EmptyReportUrl);
    }
    Ok(format!(
        "[{}]\n{url}\n→ {}",
        catalog.text("dashboard.report_title"),
        catalog.text("dashboard.download_report_button")
    ))
}

/// Renders the static medical disclaimer.
pub fn render_disclaimer(catalog: &Catalog) -> String {
    format!(
        "! {}: {}",
        catalog.text("dashboard.disclaimer_title"),
        catalog.text("dashboard.disclaimer_text")
    )
}

/// Renders the external resources list.
pub fn render_external_resources(resources: &[ExternalResource], catalog: &Catalog) -> String {
    let mut lines = vec![
        format!("[{}]", catalog.text("dashboard.resources_title")),
        catalog.text("dashboard.resources_intro"),
    ];
    for resource in resources {
        lines.push(format!("  • {} <{}>", resource.name, resource.url));
        lines.push(format!("    {}", resource.description));
    }
    lines.join("\n")
}
