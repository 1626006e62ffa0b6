//! End to end tests over a small document tree on disk.

#![allow(missing_docs)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use asciireqs::{
    Category, Config, Diagnostics, LoadError, MergeDepth, Project, filter,
    read_and_parse_project,
    report::{process_document_tree, write_report},
};
use tempfile::TempDir;

const UR: &str = "\
= User requirements
:req-id: UR-\\d+
:req-children: sw.adoc, hw.adoc

[.reqs]
|===
| ID | Text | Child

| UR-1 | The device shall start within two seconds. | SW-1, HW-1
| UR-2 | The device shall log its start-up. | SW-2
|===
";

const SW: &str = "\
= Software requirements
:req-id: SW-\\d+

SW-1::
Start-up:
+
Boot the application
in parallel with HW-1.
+
Parent: UR-1; Tags: boot

[.reqy]
----
SW-2:
  Text: Write a start-up record
  Parent: UR-2
SW-3:
  Text: Rotate logs
  Parent: UR-9
----
";

const HW: &str = "\
= Hardware requirements
:req-id: HW-\\d+

[.req]
|===
| HW-1 | Power rails settle in 100ms
| Parent: UR-1 | Tags: power
|===

[.reqs]
|===
| ID | Text

| SW-1 | Not a hardware identifier
|===
";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn load(dir: &Path) -> (Project, Diagnostics) {
    let root = write(dir, "ur.adoc", UR);
    write(dir, "sw.adoc", SW);
    write(dir, "hw.adoc", HW);
    let mut diagnostics = Diagnostics::new();
    let project = read_and_parse_project(&root, &Config::default(), &mut diagnostics).unwrap();
    (project, diagnostics)
}

#[test]
fn tree_is_loaded_and_indexed() {
    let dir = TempDir::new().unwrap();
    let (project, diagnostics) = load(dir.path());

    let ids: Vec<_> = project.requirements().filter_map(|req| req.id()).collect();
    assert_eq!(ids, ["UR-1", "UR-2", "SW-1", "SW-2", "SW-3", "HW-1"]);
    assert_eq!(project.document_of("HW-1").unwrap().name(), "hw.adoc");

    let sw1 = project.requirement("SW-1").unwrap();
    assert_eq!(sw1.title(), Some("Start-up"));
    assert_eq!(sw1.text(), Some("Boot the application\nin parallel with HW-1."));
    assert_eq!(sw1.get("Tags"), Some("boot"));

    // hw.adoc's table row carries an ID from another document's pattern.
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.category, Category::Validation);
    assert_eq!(diagnostic.source.as_deref(), Some("hw.adoc"));
}

fn matching(project: &Project, expression: &str) -> Vec<String> {
    project
        .requirements()
        .filter(|req| filter::evaluate(req, project, expression).unwrap())
        .filter_map(|req| req.id().map(str::to_string))
        .collect()
}

#[test]
fn filters_see_the_whole_project() {
    let dir = TempDir::new().unwrap();
    let (project, _) = load(dir.path());

    assert_eq!(matching(&project, "Parent == 'UR-1'"), ["SW-1", "HW-1"]);
    assert_eq!(matching(&project, "has_invalid_link()"), ["SW-3"]);
    assert_eq!(
        matching(&project, "Parent != '' and not link_error()"),
        ["SW-1", "SW-2", "HW-1"]
    );
    assert_eq!(matching(&project, "'boot' in elements(Tags)"), ["SW-1"]);
}

#[test]
fn merge_depth_comes_from_config() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.adoc", ":req-id: A-\\d+\n:req-children: b.adoc\n\nA-1::\na\n");
    write(dir.path(), "b.adoc", ":req-children: c.adoc\n\nA-2::\nb\n");
    write(dir.path(), "c.adoc", "A-3::\nc\n");

    let root = dir.path().join("a.adoc");
    let mut config = Config::default();
    let mut diagnostics = Diagnostics::new();
    let project = read_and_parse_project(&root, &config, &mut diagnostics).unwrap();
    assert_eq!(project.len(), 2);
    assert!(!project.contains("A-3"));

    config.set_merge_depth(MergeDepth::Recursive);
    let project = read_and_parse_project(&root, &config, &mut diagnostics).unwrap();
    assert_eq!(project.len(), 3);
    assert!(diagnostics.is_empty());
}

#[test]
fn missing_child_stops_loading() {
    let dir = TempDir::new().unwrap();
    let root = write(dir.path(), "ur.adoc", UR);
    write(dir.path(), "sw.adoc", SW);

    let error =
        read_and_parse_project(&root, &Config::default(), &mut Diagnostics::new()).unwrap_err();
    assert!(matches!(error, LoadError::Io { path, .. } if path.ends_with("hw.adoc")));
}

#[test]
fn documents_are_published_with_links() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let (project, _) = load(input.path());

    let mut diagnostics = Diagnostics::new();
    let written = process_document_tree(&project, output.path(), &mut diagnostics).unwrap();
    assert_eq!(written.len(), 3);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let ur = fs::read_to_string(output.path().join("ur.adoc")).unwrap();
    assert!(ur.contains(
        "| [[UR-1]]UR-1 | The device shall start within two seconds. | \
         xref:sw.adoc#SW-1[SW-1], xref:hw.adoc#HW-1[HW-1]"
    ));

    let sw = fs::read_to_string(output.path().join("sw.adoc")).unwrap();
    assert!(sw.contains("[[SW-1]]SW-1::\nStart-up:\n+\n"));
    assert!(sw.contains("in parallel with xref:hw.adoc#HW-1[HW-1]."));
    assert!(sw.contains(
        "[[SW-2]]SW-2::\nWrite a start-up record\n+\nParent: xref:ur.adoc#UR-2[UR-2]\n\n\
         [[SW-3]]SW-3::\nRotate logs\n+\nParent: xref:ur.adoc#UR-9[UR-9]\n"
    ));
    assert!(!sw.contains("[.reqy]"));

    let hw = fs::read_to_string(output.path().join("hw.adoc")).unwrap();
    assert!(hw.contains("| [[HW-1]]HW-1 | Power rails settle in 100ms"));
    assert!(hw.contains("| Parent: xref:ur.adoc#UR-1[UR-1]"));
}

#[test]
fn report_from_template() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let (project, _) = load(input.path());
    let template = write(
        input.path(),
        "trace.adoc",
        "= Traceability\n\n`asciireq-hierarchy`\n\n\
         `asciireq-table:ID,Parent;has_invalid_link() or link_error()`\n",
    );

    let mut diagnostics = Diagnostics::new();
    let path = write_report(&project, &template, output.path(), &mut diagnostics).unwrap();

    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "= Traceability\n\n* ur.adoc\n** sw.adoc\n** hw.adoc\n\n|===\n|ID |Parent\n\n\
         |xref:sw.adoc#SW-3[SW-3]\n|xref:ur.adoc#UR-9[UR-9]\n\n|===\n"
    );
}
