use decor_core::descriptor::{BatchRun, FileTransfer, ProcessRun, TableLoad};
use decor_core::{
    Command, CommandKind, DefaultsChain, DefaultsResolver, Descriptor, DocumentError, TestSuite,
};

const SAMPLE: &str = r#"
name: decoration
defaults:
  connection-string: 'Data Source=(local)\SQL2012;Initial Catalog=AdventureWorksDW2012;Integrated Security=true'
tests:
  - name: reset and load
    setup:
      - kind: table-reset
        connection-string: 'Data Source=(local)\SQL2012;Initial Catalog=AdventureWorksDW2012;Integrated Security=true'
        table-name: Users
      - kind: table-load
        table-name: Users
        source-file: Users.csv
    cleanup:
      - kind: table-reset
        table-name: Users
  - name: connection from defaults
    setup:
      - kind: table-reset
        table-name: Users
  - name: service
    setup:
      - kind: service-start
        service-name: MyService
    cleanup:
      - kind: service-stop
        service-name: MyService
        timeout: 15000
  - name: three commands in one group
    setup:
      - kind: group
        commands:
          - kind: file-delete
            full-path: 'Temp\a.txt'
          - kind: file-delete
            full-path: 'Temp\b.txt'
          - kind: file-copy
            full-path: 'Temp\c.txt'
            source-full-path: 'Data\c.txt'
  - name: groups and commands permuted
    setup:
      - kind: group
        commands:
          - kind: file-delete
            full-path: one.txt
      - kind: group
        parallel: false
        run-once: true
        commands:
          - kind: service-start
            service-name: MyService
          - kind: table-reset
            table-name: Users
          - kind: process-run
            full-path: 'Batches\clean.exe'
            argument: '-all'
            timeout: 1000
      - kind: process-run
        full-path: load.exe
      - kind: batch-run
        full-path: 'Batches\build.sql'
        connection-string: 'Data source=(local);Initial Catalog=MyDB'
      - kind: batch-run
        full-path: 'Batches\clean.sql'
groups:
  - name: parent
    setup:
      - kind: service-start
        service-name: MyService
    tests:
      - name: first
        setup:
          - kind: table-load
            table-name: Users
            source-file: Users.csv
      - name: second
        setup:
          - kind: table-load
            table-name: Users
            source-file: Users.csv
"#;

const CONNECTION: &str =
    r"Data Source=(local)\SQL2012;Initial Catalog=AdventureWorksDW2012;Integrated Security=true";

fn sample() -> TestSuite {
    TestSuite::from_yaml_str(SAMPLE).unwrap()
}

fn resolve(suite: &TestSuite, descriptor: &Descriptor) -> Descriptor {
    DefaultsResolver::default()
        .resolve(descriptor, &DefaultsChain::root(&suite.defaults))
        .into_owned()
}

#[test]
fn test_phase_command_counts() {
    let suite = sample();
    assert_eq!(suite.tests[0].setup.len(), 2);
    assert_eq!(suite.tests[0].cleanup.len(), 1);
    assert_eq!(suite.tests[4].setup.len(), 5);
    assert!(suite.tests[1].cleanup.is_empty());
    assert_eq!(suite.test_count(), 7);
}

#[test]
fn test_table_load_command() {
    let suite = sample();
    let load = resolve(&suite, &suite.tests[0].setup.commands[1]);

    match load.command {
        Command::TableLoad(TableLoad {
            connection_string,
            table_name,
            source_file,
        }) => {
            assert_eq!(connection_string.as_deref(), Some(CONNECTION));
            assert_eq!(table_name, "Users");
            assert_eq!(source_file, "Users.csv");
        }
        other => panic!("expected table-load, got {:?}", other.kind()),
    }
}

#[test]
fn test_connection_string_from_defaults() {
    let suite = sample();
    let declared = &suite.tests[1].setup.commands[0];
    assert_eq!(declared.command.connection_string(), None);

    let resolved = resolve(&suite, declared);
    assert_eq!(resolved.kind(), CommandKind::TableReset);
    assert_eq!(resolved.command.connection_string(), Some(CONNECTION));
}

#[test]
fn test_service_timeouts() {
    let suite = sample();

    let start = resolve(&suite, &suite.tests[2].setup.commands[0]);
    assert_eq!(start.kind(), CommandKind::ServiceStart);
    assert_eq!(start.timeout_ms(), 5000);
    assert_eq!(start.command.label(), "MyService");

    let stop = resolve(&suite, &suite.tests[2].cleanup.commands[0]);
    assert_eq!(stop.kind(), CommandKind::ServiceStop);
    assert_eq!(stop.timeout_ms(), 15000);
}

#[test]
fn test_group_attribute_defaults() {
    let suite = sample();
    let descriptor = &suite.tests[3].setup.commands[0];

    assert!(!descriptor.is_run_once());
    match &descriptor.command {
        Command::Group(group) => {
            assert_eq!(group.commands.len(), 3);
            assert!(group.is_parallel());
            assert_eq!(group.parallel, None);
            assert_eq!(
                group.commands[2].command,
                Command::FileCopy(FileTransfer {
                    full_path: r"Temp\c.txt".to_string(),
                    source_full_path: r"Data\c.txt".to_string(),
                })
            );
        }
        other => panic!("expected group, got {:?}", other.kind()),
    }
}

#[test]
fn test_sequential_run_once_group() {
    let suite = sample();
    let descriptor = &suite.tests[4].setup.commands[1];

    assert!(descriptor.is_run_once());
    let Command::Group(group) = &descriptor.command else {
        panic!("expected group");
    };
    assert!(!group.is_parallel());
    assert_eq!(group.commands[2].kind(), CommandKind::ProcessRun);
}

#[test]
fn test_process_run() {
    let suite = sample();
    let Command::Group(group) = &suite.tests[4].setup.commands[1].command else {
        panic!("expected group");
    };

    let clean = resolve(&suite, &group.commands[2]);
    assert_eq!(
        clean.command,
        Command::ProcessRun(ProcessRun {
            full_path: r"Batches\clean.exe".to_string(),
            argument: Some("-all".to_string()),
        })
    );
    assert_eq!(clean.timeout_ms(), 1000);

    let load = resolve(&suite, &suite.tests[4].setup.commands[2]);
    assert_eq!(load.command.label(), "load.exe");
    assert_eq!(load.timeout, Some(0));
}

#[test]
fn test_batch_run() {
    let suite = sample();

    let build = resolve(&suite, &suite.tests[4].setup.commands[3]);
    assert_eq!(
        build.command,
        Command::BatchRun(BatchRun {
            full_path: r"Batches\build.sql".to_string(),
            connection_string: Some("Data source=(local);Initial Catalog=MyDB".to_string()),
        })
    );

    let clean = resolve(&suite, &suite.tests[4].setup.commands[4]);
    assert_eq!(clean.command.connection_string(), Some(CONNECTION));
}

#[test]
fn test_parent_setup_applies_to_each_test() {
    let suite = sample();
    let contexts: Vec<_> = suite
        .tests()
        .into_iter()
        .filter(|c| !c.groups.is_empty())
        .collect();

    assert_eq!(contexts.len(), 2);
    for context in contexts {
        let parent = &context.groups[0].group;
        assert_eq!(parent.setup.commands[0].kind(), CommandKind::ServiceStart);
        assert_eq!(context.test.setup.commands[0].kind(), CommandKind::TableLoad);
        assert_eq!(context.group_key().as_str(), "group[0]");
    }
}

#[test]
fn test_json_document() {
    let json = r#"{
        "name": "json",
        "tests": [{
            "name": "etl",
            "setup": [
                { "kind": "etl-run", "path": "/Packages/", "name": "Load", "run-once": true },
                { "kind": "file-move", "full-path": "out.csv", "source-full-path": "in.csv" }
            ]
        }]
    }"#;

    let suite = TestSuite::from_json_str(json).unwrap();
    let setup = &suite.tests[0].setup.commands;
    assert_eq!(setup[0].kind(), CommandKind::EtlRun);
    assert!(setup[0].is_run_once());
    assert_eq!(setup[0].command.label(), "/Packages/Load");
    assert_eq!(setup[1].command.label(), "in.csv -> out.csv");
}

#[test]
fn test_unknown_kind_is_rejected() {
    let yaml = r#"
tests:
  - name: broken
    setup:
      - kind: registry-write
        key: HKLM
"#;
    assert!(matches!(
        TestSuite::from_yaml_str(yaml),
        Err(DocumentError::Yaml(_))
    ));
}

#[test]
fn test_from_file_picks_format_by_extension() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("suite.yml");
    std::fs::write(&path, SAMPLE).unwrap();

    let suite = TestSuite::from_file(&path).unwrap();
    assert_eq!(suite, sample());

    let missing = dir.path().join("missing.yaml");
    assert!(matches!(
        TestSuite::from_file(&missing),
        Err(DocumentError::Io { .. })
    ));
}

#[test]
fn test_yaml_round_trip_keeps_unset_fields_unset() {
    let suite = sample();
    let yaml = serde_yaml::to_string(&suite).unwrap();
    let reparsed = TestSuite::from_yaml_str(&yaml).unwrap();

    assert_eq!(reparsed, suite);
    assert!(!yaml.contains("parallel: true"));
}

#[test]
fn test_service_running_check() {
    let yaml = r#"
tests:
  - name: needs service
    setup:
      - kind: service-running
        service-name: MyService
      - kind: table-reset
        table-name: Users
"#;
    let suite = TestSuite::from_yaml_str(yaml).unwrap();
    let check = resolve(&suite, &suite.tests[0].setup.commands[0]);

    assert_eq!(check.kind(), CommandKind::ServiceRunning);
    assert_eq!(check.command.label(), "MyService");
    assert_eq!(check.timeout_ms(), 5000);
}

#[test]
fn test_base_path_anchors_relative_files() {
    let yaml = r#"
defaults:
  base-path: /srv/suite
tests:
  - name: load
    setup:
      - kind: table-load
        connection-string: db
        table-name: Users
        source-file: Users.csv
      - kind: file-delete
        full-path: /tmp/absolute.txt
      - kind: process-run
        full-path: load.exe
"#;
    let suite = TestSuite::from_yaml_str(yaml).unwrap();
    assert_eq!(suite.defaults.base_path.as_deref(), Some("/srv/suite"));

    let setup = &suite.tests[0].setup.commands;
    let load = resolve(&suite, &setup[0]);
    assert_eq!(load.command.file_paths(), vec!["/srv/suite/Users.csv"]);

    let delete = resolve(&suite, &setup[1]);
    assert_eq!(delete.command.file_paths(), vec!["/tmp/absolute.txt"]);

    let exe = resolve(&suite, &setup[2]);
    assert_eq!(exe.command.label(), "load.exe");
}
