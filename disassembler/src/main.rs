mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;

use asf_core::serialize::{to_json, ModuleDump, TextDump, YamlDump};
use asf_core::vm::{Environment, FlatLinker, PointerWidth, Registry};
use asf_core::{FsSource, ModuleResolver};

use config::DumpConfig;

/// Dump an ASF script container and its dependencies
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Module to dump, relative to the data root
    module: String,

    /// Folder the module and its dependencies live in
    #[arg(short, long)]
    data_root: Option<PathBuf>,

    /// Environment registry (JSON) with the host-registered symbols
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Write the text dump here instead of stdout
    #[arg(long)]
    text: Option<PathBuf>,

    #[arg(long)]
    yaml: Option<PathBuf>,

    #[arg(long)]
    json: Option<PathBuf>,

    /// Re-encode the root container here
    #[arg(long)]
    binary: Option<PathBuf>,

    /// TOML file with defaults for the options above
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Width of pointer operands in the bytecode (32 or 64)
    #[arg(long)]
    pointer_width: Option<PointerWidth>,

    /// Log dependency discovery and other details
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct Report {
    functions: usize,
    failed: usize,
}

fn dump(args: &Args, config: &DumpConfig) -> Result<Report> {
    let data_root = args
        .data_root
        .as_ref()
        .or(config.data_root.as_ref())
        .context("no data root: pass --data-root or set data_root in the config")?;
    let width = args.pointer_width.unwrap_or(config.pointer_width);

    let environment = match args.registry.as_ref().or(config.registry.as_ref()) {
        Some(path) => Environment::from_registry(&Registry::from_path(path)?),
        None => {
            log::warn!("no registry given, host symbols will not resolve");
            Environment::default()
        }
    };

    let mut resolver = ModuleResolver::new(FsSource::new(data_root), FlatLinker::new(environment));
    let module = resolver
        .resolve(&args.module, true)
        .with_context(|| format!("loading {}", args.module))?;
    log::info!("{} modules loaded", resolver.loaded());

    let dump = ModuleDump::collect(&module.direct_dependencies, &module.symbols, width);

    let has_output = [&args.text, &args.yaml, &args.json, &args.binary]
        .iter()
        .any(|path| path.is_some());
    if !has_output {
        print!("{}", TextDump(&dump));
    }
    if let Some(path) = &args.text {
        write_output(path, TextDump(&dump).to_string())?;
    }
    if let Some(path) = &args.yaml {
        write_output(path, YamlDump(&dump).to_string())?;
    }
    if let Some(path) = &args.json {
        write_output(path, serde_json::to_string_pretty(&to_json(&dump))?)?;
    }
    if let Some(path) = &args.binary {
        write_output(path, module.to_container().to_bytes()?)?;
    }

    Ok(Report {
        functions: dump.functions.len(),
        failed: dump.failures().count(),
    })
}

fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("writing output: {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DumpConfig::read(path)?,
        None => DumpConfig::default(),
    };
    config.logger.init(args.verbose);

    let report = dump(&args, &config)?;
    if report.failed > 0 {
        bail!(
            "{} of {} functions failed to disassemble",
            report.failed,
            report.functions
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asf_core::vm::Opcode;
    use asf_core::AsfContainer;
    use pretty_assertions::assert_eq;

    fn words(code: &[u32]) -> Vec<u8> {
        code.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn data_root(main_code: &[u32]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("lib.bin"),
            AsfContainer::encode::<&str>(&[], &words(&[Opcode::RET as u32])).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("main.bin"),
            AsfContainer::encode(&["lib.bin"], &words(main_code)).unwrap(),
        )
        .unwrap();
        dir
    }

    #[test]
    fn writes_every_format() -> Result<()> {
        let dir = data_root(&[Opcode::SUSPEND as u32]);
        let out = dir.path().join("out");
        let args = Args::parse_from([
            "asfdis".as_ref(),
            "main.bin".as_ref(),
            "--data-root".as_ref(),
            dir.path().as_os_str(),
            "--text".as_ref(),
            out.join("main.txt").as_os_str(),
            "--yaml".as_ref(),
            out.join("main.yaml").as_os_str(),
            "--json".as_ref(),
            out.join("main.json").as_os_str(),
            "--binary".as_ref(),
            out.join("main.bin").as_os_str(),
        ]);

        let report = dump(&args, &DumpConfig::default())?;
        assert_eq!(report, Report { functions: 1, failed: 0 });

        let text = std::fs::read_to_string(out.join("main.txt"))?;
        assert!(text.starts_with("dependencies: 1\n\tlib.bin\n"));
        assert!(text.contains("\t\t0000: SUSPEND\n"));

        let yaml = std::fs::read_to_string(out.join("main.yaml"))?;
        assert!(yaml.contains("  void main():\n    - SUSPEND\n"));

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out.join("main.json"))?)?;
        assert_eq!(json["dependencies"][0], "lib.bin");

        assert_eq!(std::fs::read(out.join("main.bin"))?, std::fs::read(dir.path().join("main.bin"))?);
        Ok(())
    }

    #[test]
    fn config_supplies_defaults() -> Result<()> {
        let dir = data_root(&[Opcode::PGA as u32, 0x10, 0]);
        let config = DumpConfig {
            data_root: Some(dir.path().to_path_buf()),
            pointer_width: PointerWidth::Bits64,
            ..Default::default()
        };
        let text_path = dir.path().join("main.txt");
        let args = Args::parse_from([
            "asfdis".as_ref(),
            "main.bin".as_ref(),
            "--text".as_ref(),
            text_path.as_os_str(),
        ]);

        dump(&args, &config)?;
        let text = std::fs::read_to_string(&text_path)?;
        assert!(text.contains("0000: PGA      0x10 ({unresolved})"), "{text}");
        Ok(())
    }

    #[test]
    fn counts_failed_functions() -> Result<()> {
        let dir = data_root(&[Opcode::SUSPEND as u32, 0xcd]);
        let text_path = dir.path().join("main.txt");
        let args = Args::parse_from([
            "asfdis".as_ref(),
            "main.bin".as_ref(),
            "-d".as_ref(),
            dir.path().as_os_str(),
            "--text".as_ref(),
            text_path.as_os_str(),
        ]);

        let report = dump(&args, &DumpConfig::default())?;
        assert_eq!(report, Report { functions: 1, failed: 1 });
        // the output is still written
        assert!(std::fs::read_to_string(&text_path)?.contains("; error: unknown opcode 0xCD"));
        Ok(())
    }

    #[test]
    fn missing_data_root() {
        let args = Args::parse_from(["asfdis", "main.bin"]);
        let err = dump(&args, &DumpConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no data root"));
    }

    #[test]
    fn missing_module_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "asfdis".as_ref(),
            "scripts/none.bin".as_ref(),
            "-d".as_ref(),
            dir.path().as_os_str(),
        ]);
        let err = dump(&args, &DumpConfig::default()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("none.bin"), "{message}");
    }

    #[test]
    fn pointer_width_flag() {
        let args = Args::parse_from(["asfdis", "a.bin", "--pointer-width", "64"]);
        assert_eq!(args.pointer_width, Some(PointerWidth::Bits64));
        assert!(Args::try_parse_from(["asfdis", "a.bin", "--pointer-width", "16"]).is_err());
    }
}
