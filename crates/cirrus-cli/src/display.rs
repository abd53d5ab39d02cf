//! Display formatting for CLI output
//!
//! Renders plans, drift reports, stored state and the resource type table.
//! Every renderer returns a `String` so commands can print it and tests can
//! snapshot it.

use cirrus_core::{AttributeChange, PlanAction};
use cirrus_provider::{Drift, DriftReport, Plan, PlannedChange, Provider, StoredInstance};
use console::{Style, style};
use std::fmt::Write;

use crate::util::truncate_value;

/// Longest attribute value shown inline
const MAX_VALUE_WIDTH: usize = 72;

fn action_style(action: PlanAction) -> Style {
    match action {
        PlanAction::Create => Style::new().green(),
        PlanAction::Update => Style::new().yellow(),
        PlanAction::Replace => Style::new().magenta(),
        PlanAction::Delete => Style::new().red(),
        PlanAction::NoOp => Style::new().dim(),
    }
}

fn action_symbol(action: PlanAction) -> &'static str {
    match action {
        PlanAction::Create => "+",
        PlanAction::Update => "~",
        PlanAction::Replace => "-/+",
        PlanAction::Delete => "-",
        PlanAction::NoOp => " ",
    }
}

fn quoted(value: &str) -> String {
    format!("{:?}", truncate_value(value, MAX_VALUE_WIDTH))
}

fn render_change(out: &mut String, change: &AttributeChange) {
    let line = match (&change.old, &change.new) {
        (None, Some(new)) => format!("+ {} = {}", change.path, quoted(new)),
        (Some(old), None) => format!("- {} = {}", change.path, quoted(old)),
        (Some(old), Some(new)) => format!("~ {}: {} -> {}", change.path, quoted(old), quoted(new)),
        (None, None) => return,
    };
    let styled = match (&change.old, &change.new) {
        (None, _) => style(line).green(),
        (_, None) => style(line).red(),
        _ => style(line).yellow(),
    };
    let _ = writeln!(out, "      {}", styled);
}

fn render_header(out: &mut String, change: &PlannedChange) {
    let action = change.action();
    let detail = match action {
        PlanAction::Replace if !change.result.replace_because.is_empty() => format!(
            "replace, forced by {}",
            change.result.replace_because.join(", ")
        ),
        other => other.to_string(),
    };
    let _ = writeln!(
        out,
        "  {} {} ({})",
        action_style(action).apply_to(action_symbol(action)),
        style(&change.address).bold(),
        detail
    );
}

/// Render the actionable part of a plan followed by its summary
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();

    for change in plan.actionable() {
        render_header(&mut out, change);
        if change.action() != PlanAction::Delete {
            for attribute_change in change.result.changes.iter() {
                render_change(&mut out, attribute_change);
            }
        }
    }

    if plan.has_changes() {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", style(plan.summary()).bold());
    out
}

/// Render refresh results, one line per stored instance
pub fn render_drift(reports: &[DriftReport]) -> String {
    let mut out = String::new();
    if reports.is_empty() {
        let _ = writeln!(out, "No resources in state.");
        return out;
    }

    for report in reports {
        match &report.drift {
            Drift::InSync => {
                let _ = writeln!(
                    out,
                    "  {} {} ({})",
                    style("✓").green(),
                    report.address,
                    report.id
                );
            }
            Drift::Changed { changes } => {
                let _ = writeln!(
                    out,
                    "  {} {} ({}) changed outside cirrus",
                    style("~").yellow(),
                    style(&report.address).bold(),
                    report.id
                );
                for change in changes {
                    render_change(&mut out, change);
                }
            }
            Drift::Gone => {
                let _ = writeln!(
                    out,
                    "  {} {} ({}) no longer exists",
                    style("✗").red(),
                    style(&report.address).bold(),
                    report.id
                );
            }
        }
    }
    out
}

/// Table of stored instances
pub fn render_state_list(instances: &[StoredInstance]) -> String {
    let mut out = String::new();
    if instances.is_empty() {
        let _ = writeln!(out, "No resources in state.");
        return out;
    }

    let width = instances
        .iter()
        .map(|i| i.address().len())
        .max()
        .unwrap_or(0)
        .max("ADDRESS".len());
    let _ = writeln!(
        out,
        "{:<width$}  {:<24}  {}",
        style("ADDRESS").bold(),
        style("ID").bold(),
        style("UPDATED").bold(),
        width = width
    );
    for instance in instances {
        let _ = writeln!(
            out,
            "{:<width$}  {:<24}  {}",
            instance.address(),
            instance.id,
            instance.updated_at.format("%Y-%m-%d %H:%M:%S"),
            width = width
        );
    }
    out
}

/// Table of resource types known to `provider`
pub fn render_resources(provider: &Provider) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<34}  {:<14}  {:<16}  {}",
        style("TYPE").bold(),
        style("SERVICE").bold(),
        style("NAME").bold(),
        style("TAGS").bold()
    );
    for (service, registration) in provider.registrations() {
        let _ = writeln!(
            out,
            "{:<34}  {:<14}  {:<16}  {}",
            registration.type_name,
            service,
            registration.name,
            if registration.tags.is_some() { "yes" } else { "no" }
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::{ChangeSet, PlanResult};

    fn change(address: &str, result: PlanResult) -> PlannedChange {
        let (resource_type, name) = address.split_once('.').unwrap();
        PlannedChange {
            address: address.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            result,
        }
    }

    fn attribute(path: &str, old: Option<&str>, new: Option<&str>) -> AttributeChange {
        AttributeChange {
            path: path.to_string(),
            old: old.map(str::to_string),
            new: new.map(str::to_string),
        }
    }

    #[test]
    fn test_render_plan() {
        console::set_colors_enabled(false);

        let plan = Plan {
            changes: vec![
                change(
                    "aws_codecommit_repository.main",
                    PlanResult {
                        action: PlanAction::Update,
                        changes: [attribute("description", Some("old"), Some("new"))]
                            .into_iter()
                            .collect::<ChangeSet>(),
                        replace_because: Vec::new(),
                    },
                ),
                change(
                    "aws_codecommit_repository.new",
                    PlanResult {
                        action: PlanAction::Create,
                        changes: [attribute("repository_name", None, Some("new"))]
                            .into_iter()
                            .collect::<ChangeSet>(),
                        replace_because: Vec::new(),
                    },
                ),
                change("aws_codecommit_repository.same", PlanResult::noop()),
                change(
                    "aws_bedrockagent_knowledge_base.kb",
                    PlanResult {
                        action: PlanAction::Replace,
                        changes: [attribute("storage_configuration.0.type", Some("RDS"), Some("OPENSEARCH_SERVERLESS"))]
                            .into_iter()
                            .collect::<ChangeSet>(),
                        replace_because: vec!["storage_configuration".to_string()],
                    },
                ),
                change(
                    "aws_codecommit_repository.old",
                    PlanResult {
                        action: PlanAction::Delete,
                        changes: [attribute("repository_name", Some("old"), None)]
                            .into_iter()
                            .collect::<ChangeSet>(),
                        replace_because: Vec::new(),
                    },
                ),
            ],
        };

        insta::assert_snapshot!(render_plan(&plan), @r#"
          ~ aws_codecommit_repository.main (update)
              ~ description: "old" -> "new"
          + aws_codecommit_repository.new (create)
              + repository_name = "new"
          -/+ aws_bedrockagent_knowledge_base.kb (replace, forced by storage_configuration)
              ~ storage_configuration.0.type: "RDS" -> "OPENSEARCH_SERVERLESS"
          - aws_codecommit_repository.old (delete)

        Plan: 1 to create, 1 to update, 1 to replace, 1 to destroy.
        "#);
    }

    #[test]
    fn test_render_empty_plan() {
        console::set_colors_enabled(false);
        assert_eq!(render_plan(&Plan::default()), "No changes.\n");
    }

    #[test]
    fn test_render_drift() {
        console::set_colors_enabled(false);

        let reports = vec![
            DriftReport {
                address: "aws_codecommit_repository.a".to_string(),
                id: "a".to_string(),
                drift: Drift::InSync,
            },
            DriftReport {
                address: "aws_codecommit_repository.b".to_string(),
                id: "b".to_string(),
                drift: Drift::Changed {
                    changes: vec![attribute("description", Some("x"), None)],
                },
            },
            DriftReport {
                address: "aws_codecommit_repository.c".to_string(),
                id: "c".to_string(),
                drift: Drift::Gone,
            },
        ];

        insta::assert_snapshot!(render_drift(&reports), @r#"
          ✓ aws_codecommit_repository.a (a)
          ~ aws_codecommit_repository.b (b) changed outside cirrus
              - description = "x"
          ✗ aws_codecommit_repository.c (c) no longer exists
        "#);
    }
}
