//! Minimal POM reading: coordinates, properties and direct dependencies.
//!
//! Parent inheritance and `dependencyManagement` are not modelled; a
//! dependency without a version after property substitution is skipped.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::Coordinate;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex"));

/// A dependency entry as written in the POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub optional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
}

impl Pom {
    pub fn parse(text: &str) -> Result<Pom, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        let project = doc.root_element();

        let mut pom = Pom {
            group_id: child_text(&project, "groupId"),
            artifact_id: child_text(&project, "artifactId"),
            version: child_text(&project, "version"),
            packaging: child_text(&project, "packaging"),
            ..Pom::default()
        };

        if let Some(parent) = child_element(&project, "parent") {
            if pom.group_id.is_none() {
                pom.group_id = child_text(&parent, "groupId");
            }
            if pom.version.is_none() {
                pom.version = child_text(&parent, "version");
            }
        }

        if let Some(props) = child_element(&project, "properties") {
            for child in props.children().filter(|n| n.is_element()) {
                if let Some(value) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                    pom.properties
                        .insert(child.tag_name().name().to_string(), value.to_string());
                }
            }
        }

        if let Some(deps) = child_element(&project, "dependencies") {
            pom.dependencies = deps
                .children()
                .filter(|n| n.is_element() && n.has_tag_name("dependency"))
                .filter_map(|dep| {
                    Some(PomDependency {
                        group_id: child_text(&dep, "groupId")?,
                        artifact_id: child_text(&dep, "artifactId")?,
                        version: child_text(&dep, "version"),
                        scope: child_text(&dep, "scope"),
                        classifier: child_text(&dep, "classifier"),
                        type_: child_text(&dep, "type"),
                        optional: child_text(&dep, "optional").as_deref() == Some("true"),
                    })
                })
                .collect();
        }

        Ok(pom)
    }

    /// Whether the POM describes a module without a jar of its own.
    pub fn is_aggregate(&self) -> bool {
        self.packaging.as_deref() == Some("pom")
    }

    /// Expand `${...}` references from the POM's own properties and project
    /// fields. Unknown references are left untouched.
    pub fn interpolate(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let key = &caps[1];
                let value = match key {
                    "project.version" | "pom.version" | "version" => self.version.clone(),
                    "project.groupId" | "pom.groupId" => self.group_id.clone(),
                    "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
                    _ => self.properties.get(key).cloned(),
                };
                value.unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Non-optional `compile` and `runtime` dependencies with concrete-enough
    /// versions, in declaration order.
    pub fn runtime_dependencies(&self) -> Vec<Coordinate> {
        self.dependencies
            .iter()
            .filter(|dep| !dep.optional)
            .filter(|dep| matches!(dep.scope.as_deref(), None | Some("compile") | Some("runtime")))
            .filter(|dep| matches!(dep.type_.as_deref(), None | Some("jar") | Some("bundle")))
            .filter_map(|dep| {
                let version = self.interpolate(dep.version.as_deref()?);
                if version.contains("${") {
                    tracing::debug!(
                        "skipping {}:{} with unresolved version {}",
                        dep.group_id,
                        dep.artifact_id,
                        version
                    );
                    return None;
                }
                let group = self.interpolate(&dep.group_id);
                let coordinate = Coordinate::new(group, &dep.artifact_id, version);
                Some(match &dep.classifier {
                    Some(classifier) => coordinate.with_classifier(self.interpolate(classifier)),
                    None => coordinate,
                })
            })
            .collect()
    }
}

fn child_element<'a, 'input>(
    node: &roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Versions listed in a `maven-metadata.xml` document.
pub fn metadata_versions(text: &str) -> Result<Vec<String>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(text)?;
    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("versions"))
        .flat_map(|versions| versions.children())
        .filter(|n| n.is_element() && n.has_tag_name("version"))
        .filter_map(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
