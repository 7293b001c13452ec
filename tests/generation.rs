//! End-to-end generation scenarios

use std::fs;
use std::path::{Path, PathBuf};

use comut::codegen::apply_substitution;
use comut::config::{LineColumn, RangeConfig};
use comut::frontend::{parse, SourceLocation, SourceMap, SourceRange};
use comut::{
    generate_mutants, run_generation, Config, Inventory, MutantEntry, MutationBounds,
    MutationError, OperatorConfig, OperatorSet,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn config_for(output_dir: &Path, operators: Vec<OperatorConfig>) -> Config {
    let mut config = Config::default();
    config.settings.output_dir = output_dir.to_path_buf();
    config.settings.limit = 10;
    config.operators = operators;
    config
}

fn generate(src: &str, operators: &[OperatorConfig]) -> Vec<MutantEntry> {
    let map = SourceMap::new(src);
    let tu = parse(&map).unwrap();
    let inventory = Inventory::gather(&tu, &map);
    let set = OperatorSet::from_config(operators, usize::MAX).unwrap();
    generate_mutants(&map, &tu, &inventory, MutationBounds::whole_file(&map), &set)
        .unwrap()
        .entries()
        .to_vec()
}

fn replacements(src: &str, operators: &[OperatorConfig]) -> Vec<String> {
    generate(src, operators)
        .into_iter()
        .map(|e| e.replacement)
        .collect()
}

const PROGRAM: &str = r#"int table[4];
int total;
double ratio = 0.5;
char *greeting = "hello ";

struct point { int x; int y; };

static int scale(int v, int by)
{
    return v * by / 2;
}

int sum(int *values, int n)
{
    int i;
    int s = 0;
    for (i = 0; i < n; i++) {
        s += values[i];
    }
    if (s > 10 && n != 0)
        s = s % n;
    return s;
}

int classify(struct point *p, char c)
{
    int kind = 0;
    switch (c) {
    case 'a':
        kind = p->x + 1;
        break;
    case 2:
        kind = p->y - scale(p->x, 3);
        break;
    default:
        kind = -1;
    }
    while (kind > 100)
        kind >>= 1;
    return kind;
}
"#;

#[test]
fn test_single_operator_scenario() {
    let dir = TempDir::new().unwrap();
    let input = write_source(dir.path(), "x.c", "int x = 1 + 2;");
    let out = dir.path().join("out");
    let config = config_for(&out, vec![OperatorConfig::new("OAAN", &["+"], &["-", "*"])]);

    let outcome = run_generation(&config, &input).unwrap();

    assert_eq!(outcome.entries.len(), 2);
    let plus = SourceRange::new(SourceLocation::new(1, 11), SourceLocation::new(1, 12));
    for entry in &outcome.entries {
        assert_eq!(entry.operator, "OAAN");
        assert_eq!(entry.original, "+");
        assert_eq!(entry.original_range, plus);
        assert_ne!(entry.replacement, "+");
    }
    let tokens: Vec<_> = outcome.entries.iter().map(|e| e.replacement.as_str()).collect();
    assert_eq!(tokens, ["*", "-"]);

    let database = fs::read_to_string(&outcome.database).unwrap();
    let rows: Vec<Vec<&str>> = database.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], "x.MUT1");
    assert_eq!(rows[0][2], "OAAN");
    assert_eq!(&rows[0][4..9], ["1", "11", "1", "12", "+"]);
    assert_eq!(rows[1][13], "-");

    assert_eq!(outcome.mutant_files.len(), 2);
    assert_eq!(
        fs::read_to_string(out.join("x.MUT1.c")).unwrap(),
        "int x = 1 * 2;"
    );
    assert_eq!(
        fs::read_to_string(out.join("x.MUT2.c")).unwrap(),
        "int x = 1 - 2;"
    );
}

#[test]
fn test_mutant_files_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_source(dir.path(), "prog.c", PROGRAM);
    let out = dir.path().join("mutants");
    let config = config_for(&out, Vec::new());

    let outcome = run_generation(&config, &input).unwrap();
    assert!(outcome.entries.len() > 100);
    assert_eq!(outcome.mutant_files.len(), outcome.entries.len());

    let map = SourceMap::new(PROGRAM);
    for (entry, path) in outcome.entries.iter().zip(&outcome.mutant_files) {
        assert_ne!(entry.replacement, entry.original);
        assert_eq!(map.slice(entry.original_range), entry.original);
        let expected = apply_substitution(&map, entry.original_range, &entry.replacement);
        assert_eq!(fs::read_to_string(path).unwrap(), expected);
    }
}

#[test]
fn test_every_catalog_family_fires() {
    let dir = TempDir::new().unwrap();
    let input = write_source(dir.path(), "prog.c", PROGRAM);
    let config = config_for(&dir.path().join("out"), Vec::new());
    let outcome = run_generation(&config, &input).unwrap();
    let report = comut::GenerationReport::new(&outcome);
    for operator in ["OAAN", "ORRN", "OLLN", "OCNG", "CGCR", "CLCR", "VLSR", "VTWD", "SSDL"] {
        assert!(report.count(operator) > 0, "{} produced nothing", operator);
    }
}

#[test]
fn test_mutation_range_and_excluded_lines() {
    let dir = TempDir::new().unwrap();
    let input = write_source(dir.path(), "prog.c", PROGRAM);
    let mut config = config_for(&dir.path().join("out"), Vec::new());
    config.settings.range = Some(RangeConfig {
        start: LineColumn { line: 14, column: None },
        end: Some(LineColumn { line: 24, column: None }),
    });
    config.settings.excluded_lines = vec![18];
    config.settings.write_mutant_files = false;

    let outcome = run_generation(&config, &input).unwrap();
    assert!(!outcome.entries.is_empty());
    assert!(outcome.mutant_files.is_empty());
    let start = SourceLocation::new(14, 1);
    let end = SourceLocation::new(25, 1);
    for entry in &outcome.entries {
        assert!(start <= entry.original_range.start);
        assert!(entry.original_range.end <= end);
        assert_ne!(entry.original_range.start.line, 18);
    }
}

#[test]
fn test_deletion_keeps_labels_reached_from_outside() {
    let src = "int f(int x)\n{\n  if (x > 3)\n    goto done;\n  {\n    x = x * 2;\n  done:\n    x++;\n  }\n  return x;\n}\n";
    let entries = generate(src, &[OperatorConfig::named("SSDL")]);
    let deleted: Vec<_> = entries.iter().map(|e| e.original.as_str()).collect();
    assert!(!deleted.iter().any(|o| o.contains("done:")));
    assert!(deleted.contains(&"goto done;"));
    assert!(deleted.contains(&"x = x * 2;"));
    assert!(deleted.contains(&"return x;"));
}

#[test]
fn test_lowercase_operator_names() {
    let entries = generate(
        "int f(int a) { return a + 1; }",
        &[OperatorConfig::new("oaan", &[], &["-"])],
    );
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operator, "OAAN");
    assert_eq!(entries[0].replacement, "-");
}

#[test]
fn test_looser_operator_keeps_pointer_operands_valid() {
    let src = "int *f(int *p, int a, int b) { return a * b + p; }";
    let operators = [
        OperatorConfig::named("OASN"),
        OperatorConfig::named("OABN"),
        OperatorConfig::named("OARN"),
    ];
    assert!(generate(src, &operators).is_empty());
}

#[test]
fn test_divide_by_zero_filter() {
    let zero = replacements(
        "int f(int a) { return a / (2 + 2); }",
        &[OperatorConfig::new("OAAN", &["+"], &[])],
    );
    assert!(!zero.contains(&"-".to_string()));
    assert!(zero.contains(&"*".to_string()));

    let remainder = replacements(
        "int f(int a) { return a / 1; }",
        &[OperatorConfig::new("OAAN", &["/"], &["%"])],
    );
    assert_eq!(remainder, ["%"]);

    let constants = replacements(
        "int f(int a) { int z = 0; return a / 4; }",
        &[OperatorConfig::named("CLCR")],
    );
    assert!(!constants.contains(&"0".to_string()));
}

#[test]
fn test_negative_local_array_size_filter() {
    let src = "int g[1 + 2];\nvoid f(void) { int a[1 + 2]; a[0] = 0; }\n";
    let entries = generate(src, &[OperatorConfig::new("OAAN", &["+"], &[])]);
    assert!(entries.iter().all(|e| e.original_range.start.line == 2));
    let tokens: Vec<_> = entries.iter().map(|e| e.replacement.as_str()).collect();
    assert_eq!(tokens, ["%", "*", "/"]);
}

#[test]
fn test_variable_visibility_follows_scopes() {
    let src = "int f(int a)\n{\n  int b = a;\n  {\n    int c = b;\n    b = c;\n  }\n  return a;\n}\n";
    let entries = generate(src, &[OperatorConfig::named("VLSR")]);
    let at_return: Vec<_> = entries
        .iter()
        .filter(|e| e.original_range.start.line == 8)
        .map(|e| e.replacement.as_str())
        .collect();
    assert_eq!(at_return, ["b"]);
    for entry in &entries {
        assert_ne!(entry.original, entry.replacement);
    }
}

#[test]
fn test_errors() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir.path().join("out"), Vec::new());

    let missing = run_generation(&config, &dir.path().join("missing.c")).unwrap_err();
    assert!(matches!(missing, MutationError::FileNotFound { .. }));

    let broken = write_source(dir.path(), "broken.c", "int f( { return; }\n");
    let parse_error = run_generation(&config, &broken).unwrap_err();
    assert!(matches!(parse_error, MutationError::Parse { line: 1, .. }));

    let blocker = write_source(dir.path(), "blocker", "");
    let input = write_source(dir.path(), "ok.c", "int x = 1;\n");
    let config = config_for(&blocker, Vec::new());
    let output_error = run_generation(&config, &input).unwrap_err();
    assert!(matches!(output_error, MutationError::OutputDirectory { .. }));

    let config = config_for(&dir.path().join("out"), vec![OperatorConfig::named("NOPE")]);
    let unknown = run_generation(&config, &input).unwrap_err();
    assert!(matches!(unknown, MutationError::UnknownOperator { .. }));
}
