use asf_core::resolver::MemorySource;
use asf_core::serialize::{to_json, ModuleDump, TextDump, YamlDump};
use asf_core::vm::{Environment, FlatLinker, Opcode, PointerWidth, Registry};
use asf_core::{AsfContainer, FsSource, ModuleResolver, ResolveError};
use pretty_assertions::assert_eq;

fn words(code: &[u32]) -> Vec<u8> {
    code.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[test]
fn single_instruction_module() {
    let container = AsfContainer::encode::<&str>(&[], &words(&[Opcode::SUSPEND as u32])).unwrap();
    let mut source = MemorySource::new();
    source.insert("main.bin", container);

    let mut resolver = ModuleResolver::new(source, FlatLinker::default());
    let module = resolver.resolve("main.bin", true).unwrap();
    let dump = ModuleDump::collect(&module.direct_dependencies, &module.symbols, PointerWidth::Bits32);
    let text = TextDump(&dump).to_string();

    assert!(text.starts_with("dependencies: 0\n"));
    let body = text
        .lines()
        .filter(|line| line.starts_with("\t\t"))
        .collect::<Vec<_>>();
    assert_eq!(body, vec!["\t\t0000: SUSPEND"]);
}

#[test]
fn dependencies_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::from_slice(
        br#"{
            "global_functions": [{ "namespace": "", "declaration": "void Wait(int)" }],
            "global_properties": [{ "namespace": "", "declaration": "int g_frame" }]
        }"#,
    )
    .unwrap();

    std::fs::create_dir_all(dir.path().join("scripts/common")).unwrap();
    std::fs::write(
        dir.path().join("scripts/common/util.bin"),
        AsfContainer::encode::<&str>(&[], &words(&[Opcode::RET as u32])).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("scripts/main.bin"),
        AsfContainer::encode(
            &["scripts/common/util.bin"],
            &words(&[
                Opcode::PGA as u32,
                1,
                Opcode::CALLSYS as u32,
                1,
                Opcode::JMP as u32,
                -4i32 as u32,
            ]),
        )
        .unwrap(),
    )
    .unwrap();

    let linker = FlatLinker::new(Environment::from_registry(&registry));
    let mut resolver = ModuleResolver::new(FsSource::new(dir.path()), linker);
    let module = resolver.resolve("/scripts/main.bin", true).unwrap();
    assert_eq!(resolver.loaded(), 2);

    let dump = ModuleDump::collect(&module.direct_dependencies, &module.symbols, PointerWidth::Bits32);
    assert_eq!(dump.failures().count(), 0);

    insta::assert_snapshot!(TextDump(&dump).to_string().replace('\t', "    "), @r"
    dependencies: 1
        scripts/common/util.bin
    enums: 0
    typedefs: 0
    object_types: 0
    global_variables: 0
    imported_functions: 0
    functions: 1
        void main()
            0000: PGA      0x1 (0:g_frame)
            0002: CALLSYS  1 (void Wait(int))
            0004: JMP      -4 (d:0)
    ");

    let yaml = YamlDump(&dump).to_string();
    assert!(yaml.contains("  - scripts/common/util.bin\n"));
    assert!(yaml.contains("    - JMP      -4 (d:0)\n"));

    let json = to_json(&dump);
    assert_eq!(json["functions"]["void main()"][1], "0002: CALLSYS  1 (void Wait(int))");

    // the root container re-encodes byte for byte
    let original = std::fs::read(dir.path().join("scripts/main.bin")).unwrap();
    assert_eq!(module.to_container().to_bytes().unwrap(), original);
}

#[test]
fn missing_root_module() {
    let dir = tempfile::tempdir().unwrap();
    let mut resolver = ModuleResolver::new(FsSource::new(dir.path()), FlatLinker::default());

    let err = resolver.resolve("absent.bin", true).unwrap_err();
    assert!(matches!(err, ResolveError::ModuleNotFound { .. }));
    assert!(err.to_string().contains("absent.bin"));
}

#[test]
fn registry_enums_and_types_in_dump() {
    let registry = Registry::from_slice(
        br#"{
            "enums": [
                { "namespace": "ui", "enum_name": "Anchor", "value_name": "Left", "value": 0 },
                { "namespace": "ui", "enum_name": "Anchor", "value_name": "Right", "value": 1 }
            ],
            "object_types": [{ "namespace": "", "object_name": "Sprite", "size": 16, "flags": 1 }],
            "object_properties": [
                { "namespace": "", "object_name": "Sprite", "declaration": "int x", "offset": 0 }
            ]
        }"#,
    )
    .unwrap();
    let mut source = MemorySource::new();
    source.insert(
        "main.bin",
        AsfContainer::encode::<&str>(&[], &words(&[Opcode::OBJTYPE as u32, 1])).unwrap(),
    );

    let linker = FlatLinker::new(Environment::from_registry(&registry));
    let mut resolver = ModuleResolver::new(source, linker);
    let module = resolver.resolve("main.bin", true).unwrap();
    let dump = ModuleDump::collect(&module.direct_dependencies, &module.symbols, PointerWidth::Bits32);

    insta::assert_snapshot!(TextDump(&dump).to_string().replace('\t', "    "), @r"
    dependencies: 0
    enums: 1
        ui::Anchor
            Left = 0,
            Right = 1,
    typedefs: 0
    object_types: 1
        Sprite 16 00000001
            properties: 1
                int x
    global_variables: 0
    imported_functions: 0
    functions: 1
        void main()
            0000: OBJTYPE  0x1 (type:Sprite)
    ");

    let json = to_json(&dump);
    assert_eq!(json["enums"]["ui::Anchor"]["Right"], 1);
    assert_eq!(json["objectTypes"]["Sprite"]["properties"][0], "int x");
}
