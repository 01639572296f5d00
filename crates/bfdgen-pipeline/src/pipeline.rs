//! Generation pipeline orchestrator.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::time::Instant;

use bfdgen_codegen::names::macro_name;
use bfdgen_codegen::{
    parse_bootstrap_output, render_c_header, render_c_source, render_registry, RegistryRow,
};
use bfdgen_core::model::supported;
use bfdgen_core::{extract, ArchitectureEntry, MachineIdentifier, SymbolConvention};
use bfdgen_targets::PlatformPolicy;
use bfdgen_toolchain::{compile_and_run, BootstrapRequest, LinkPlan, SymbolProber, ToolRunner};
use tempfile::TempPath;

use crate::artifacts::{self, ArtifactStatus, GeneratedArtifactSet};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::libraries::LibrarySet;
use crate::progress::{ProgressObserver, Stage};
use crate::report::GenerationReport;

/// Everything known before any file is generated.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub policy: PlatformPolicy,
    pub libraries: LibrarySet,
    pub link: LinkPlan,
    /// Every header candidate with its probe result, in header order.
    pub entries: Vec<ArchitectureEntry>,
}

impl Discovery {
    pub fn supported_count(&self) -> usize {
        supported(&self.entries).len()
    }
}

/// Output of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub artifacts: GeneratedArtifactSet,
    pub report: GenerationReport,
}

/// Run the stages that only read: policy -> libraries -> header -> probe.
///
/// An empty supported set is not an error here.
pub fn discover(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    observer: &mut dyn ProgressObserver,
) -> Result<Discovery, PipelineError> {
    // Stage 1: Platform policy
    let policy = PlatformPolicy::resolve(&config.host);
    observer.stage(Stage::Policy, &describe_policy(&config.host.to_string(), &policy));

    // Stage 2: Library descriptors
    let libraries = LibrarySet::resolve(&config.libraries, &policy)?;
    for library in libraries.iter() {
        observer.stage(
            Stage::Libraries,
            &format!("{} ({})", library.path.display(), library.kind),
        );
    }
    let link = libraries.link_plan(&policy)?;

    // Stage 3: Header extraction
    let candidates = extract(&config.header, &config.grammar)?;
    observer.stage(
        Stage::Header,
        &format!(
            "{} machine identifiers in {}",
            candidates.len(),
            config.header.display()
        ),
    );

    // Stage 4: Symbol probing
    let prober = SymbolProber::new(runner, config.tools.nm.clone())
        .with_symbol_prefix(policy.symbol_prefix.clone());
    let found = prober.probe(&libraries.opcodes, &candidates, config.convention.as_ref())?;
    let entries = merge(candidates, &found, config.convention.as_ref());
    observer.stage(
        Stage::Probe,
        &format!(
            "{} of {} architectures have a disassembler in {}",
            found.len(),
            entries.len(),
            libraries.opcodes.path.display()
        ),
    );

    Ok(Discovery {
        policy,
        libraries,
        link,
        entries,
    })
}

/// Run the full pipeline and write the C source, C header and registry module.
///
/// Either all artifacts are written and consistent, or an error is returned
/// and neither the header nor the registry has been touched.
pub fn generate(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    observer: &mut dyn ProgressObserver,
) -> Result<PipelineOutput, PipelineError> {
    let start = Instant::now();

    let Discovery {
        policy,
        libraries,
        link,
        entries,
    } = discover(config, runner, observer)?;
    if supported(&entries).is_empty() {
        return Err(PipelineError::NoSupportedArchitectures {
            library: libraries.opcodes.path.clone(),
        });
    }

    // Stage 5: Source generation
    check_macro_names(&entries)?;
    let c_source = render_c_source(&entries, &config.c_includes);
    let c_header = render_c_header(&entries);

    let source_stage = artifacts::stage(&config.outputs.c_source, &c_source)?;
    let source_changed = source_stage.status() != ArtifactStatus::Unchanged;
    let source_artifact = source_stage.persist()?;
    // Removed on drop unless the run completes.
    let source_guard = source_changed.then(|| TempPath::from_path(&config.outputs.c_source));
    observer.stage(
        Stage::Generate,
        &format!("{} ({})", source_artifact.path.display(), source_artifact.status),
    );

    // Stage 6: Bootstrap
    fs::create_dir_all(&config.work_dir).map_err(PipelineError::io(&config.work_dir))?;
    let request = BootstrapRequest {
        compiler: config.tools.cc.as_os_str(),
        compiler_flags: &policy.compiler_flags,
        source: &config.outputs.c_source,
        work_dir: &config.work_dir,
        include_dirs: &config.include_dirs,
        link: &link,
    };
    let stdout = compile_and_run(runner, &request)?;
    let rows = parse_bootstrap_output(&stdout)?;
    check_rows(&entries, &rows)?;
    observer.stage(
        Stage::Bootstrap,
        &format!("probe program reported {} architectures", rows.len()),
    );

    // Stage 7: Registry
    let registry = render_registry(&rows);
    observer.stage(Stage::Registry, &format!("{} rows", rows.len()));

    // Stage 8: Write
    let header_stage = artifacts::stage(&config.outputs.c_header, &c_header)?;
    let registry_stage = artifacts::stage(&config.outputs.registry, &registry)?;
    let header_artifact = header_stage.persist()?;
    let registry_artifact = registry_stage.persist()?;
    for artifact in [&header_artifact, &registry_artifact] {
        observer.stage(
            Stage::Write,
            &format!("{} ({})", artifact.path.display(), artifact.status),
        );
    }
    if let Some(guard) = source_guard {
        guard.keep().map_err(|e| PipelineError::Io {
            path: config.outputs.c_source.clone(),
            source: e.error,
        })?;
    }

    let artifacts = GeneratedArtifactSet {
        c_source: source_artifact,
        c_header: header_artifact,
        registry: registry_artifact,
        entries,
        rows,
    };
    let report = GenerationReport {
        host: config.host.to_string(),
        policy,
        candidates: artifacts.entries.len(),
        supported: artifacts.rows.clone(),
        duration_ms: start.elapsed().as_millis() as u64,
        artifacts: artifacts
            .iter()
            .map(|(kind, artifact)| (kind.to_string(), artifact.clone()))
            .collect(),
    };
    log::info!(
        "generated {} supported architectures in {} ms",
        report.supported.len(),
        report.duration_ms
    );

    Ok(PipelineOutput { artifacts, report })
}

/// Combine header candidates with probe results.
pub fn merge(
    candidates: Vec<MachineIdentifier>,
    found: &[MachineIdentifier],
    convention: &dyn SymbolConvention,
) -> Vec<ArchitectureEntry> {
    let found: HashSet<&str> = found.iter().map(|m| m.name.as_str()).collect();
    candidates
        .into_iter()
        .map(|machine| {
            let bfd_name = convention.bfd_name(&machine);
            let supported = found.contains(machine.name.as_str());
            ArchitectureEntry::new(machine, bfd_name, supported)
        })
        .collect()
}

/// The probe program must print exactly the generated table, in order.
fn check_rows(entries: &[ArchitectureEntry], rows: &[RegistryRow]) -> Result<(), PipelineError> {
    let expected = supported(entries);
    if expected.len() != rows.len() {
        return Err(PipelineError::TableMismatch {
            message: format!(
                "expected {} rows, probe program printed {}",
                expected.len(),
                rows.len()
            ),
        });
    }
    for (entry, row) in expected.iter().zip(rows) {
        if entry.bfd_name != row.bfd_name {
            return Err(PipelineError::TableMismatch {
                message: format!("expected '{}', found '{}'", entry.bfd_name, row.bfd_name),
            });
        }
        if entry.machine.value != row.value {
            log::warn!(
                "{}: header text gives {}, compiled value is {}",
                entry.machine.name,
                entry.machine.value,
                row.value
            );
        }
    }
    Ok(())
}

/// Distinct names that sanitize to the same macro name would emit duplicate
/// C guards and Rust constants.
fn check_macro_names(entries: &[ArchitectureEntry]) -> Result<(), PipelineError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for entry in supported(entries) {
        let name = macro_name(&entry.bfd_name);
        if let Some(first) = seen.get(&name) {
            return Err(PipelineError::MacroNameCollision {
                first: first.to_string(),
                second: entry.bfd_name.clone(),
                macro_name: name,
            });
        }
        seen.insert(name, &entry.bfd_name);
    }
    Ok(())
}

fn describe_policy(host: &str, policy: &PlatformPolicy) -> String {
    let mut detail = host.to_string();
    if !policy.extra_libraries.is_empty() {
        detail.push_str(&format!(", extra libraries: {}", policy.extra_libraries.join(" ")));
    }
    if policy.requires_static_libiberty {
        detail.push_str(", static libiberty");
    }
    if !policy.compiler_flags.is_empty() {
        detail.push_str(&format!(", flags: {}", policy.compiler_flags.join(" ")));
    }
    detail
}
