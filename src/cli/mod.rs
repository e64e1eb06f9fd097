//! BD-030: CLI subcommands.

use crate::config::{self, ConfigError};
use crate::core::cache::BindingCache;
use crate::domain::task::Task;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter blueprint.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate blueprint.yaml without binding anything
    Validate {
        /// Path to blueprint.yaml
        #[arg(short, long, default_value = "blueprint.yaml")]
        file: PathBuf,
    },

    /// Show the order components are assembled in
    Order {
        /// Path to blueprint.yaml
        #[arg(short, long, default_value = "blueprint.yaml")]
        file: PathBuf,
    },

    /// Bind a search against a task and dump the bound graph
    Bind {
        /// Path to blueprint.yaml
        #[arg(short, long, default_value = "blueprint.yaml")]
        file: PathBuf,

        /// Task name the search is bound for
        #[arg(short, long, default_value = "task")]
        task: String,

        /// Search component to bind (default: the document root)
        #[arg(short, long)]
        search: Option<String>,

        /// Print the binding cache snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Log filter for the CLI: the `RUST_LOG` directives if given and valid,
/// otherwise `warn`.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

pub fn dispatch(cmd: Commands) -> Result<(), ConfigError> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Order { file } => cmd_order(&file),
        Commands::Bind {
            file,
            task,
            search,
            json,
        } => cmd_bind(&file, &task, search.as_deref(), json),
    }
}

const TEMPLATE: &str = r#"version: "1.0"
name: my-search
root: eager

components:
  c_eval:
    type: const
    value: 2
  w_eval:
    type: weighted
    weight: 42
    eval: c_eval
  sum_eval:
    type: sum
    evals: [c_eval, w_eval, c_eval]
  tie:
    type: tiebreaking
    evals: [sum_eval]
  eager:
    type: eager
    open: tie
    f_eval: sum_eval
"#;

fn cmd_init(path: &Path) -> Result<(), ConfigError> {
    let doc_path = path.join("blueprint.yaml");
    if doc_path.exists() {
        return Err(ConfigError::Io {
            path: doc_path,
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "already exists"),
        });
    }

    std::fs::write(&doc_path, TEMPLATE).map_err(|source| ConfigError::Io {
        path: doc_path.clone(),
        source,
    })?;

    println!("Initialized blueprint at {}", doc_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), ConfigError> {
    let doc = config::parse_document_file(file)?;
    let errors = config::validate_document(&doc);

    if errors.is_empty() {
        config::build_order(&doc)?;
        println!(
            "OK: {} ({} components, {})",
            doc.name,
            doc.components.len(),
            config::fingerprint(&doc)?
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(ConfigError::Invalid(errors))
    }
}

fn cmd_order(file: &Path) -> Result<(), ConfigError> {
    let doc = config::parse_document_file(file)?;
    let set = config::assemble(&doc)?;

    println!("Assembly order ({} components):", set.len());
    for (i, id) in set.order().iter().enumerate() {
        let kind = doc
            .components
            .get(id)
            .map(|spec| spec.kind.type_name())
            .unwrap_or("?");
        println!("  {}. {} ({})", i + 1, id, kind);
    }
    Ok(())
}

fn cmd_bind(file: &Path, task: &str, search: Option<&str>, json: bool) -> Result<(), ConfigError> {
    let set = config::load(file)?;
    let task = Arc::new(Task::new(task));
    let mut cache = BindingCache::new();

    let bound = match search {
        Some(id) => set.bind_search_with_cache(id, &task, &mut cache)?,
        None => {
            let root = set.root().ok_or(ConfigError::NoRoot)?;
            set.bind_search_with_cache(root, &task, &mut cache)?
        }
    };

    println!("{}", bound.dump());
    println!(
        "Bound {} component(s): {} created, {} reused",
        cache.len(),
        cache.misses(),
        cache.hits()
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&cache.snapshot())?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_template(dir: &Path) -> PathBuf {
        cmd_init(dir).unwrap();
        dir.join("blueprint.yaml")
    }

    #[test]
    fn test_bd030_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        assert!(path.exists());
        let doc = config::parse_document_file(&path).unwrap();
        assert!(config::validate_document(&doc).is_empty());
    }

    #[test]
    fn test_bd030_init_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blueprint.yaml"), "exists").unwrap();
        let err = cmd_init(dir.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_bd030_validate_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        dispatch(Commands::Validate { file: path }).unwrap();
    }

    #[test]
    fn test_bd030_validate_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blueprint.yaml");
        std::fs::write(&path, "version: \"2.0\"\nname: bad\n").unwrap();
        let err = cmd_validate(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_bd030_validate_reports_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blueprint.yaml");
        std::fs::write(
            &path,
            r#"
version: "1.0"
name: loop
components:
  a:
    type: weighted
    weight: 1
    eval: b
  b:
    type: weighted
    weight: 1
    eval: a
"#,
        )
        .unwrap();
        assert!(matches!(cmd_validate(&path).unwrap_err(), ConfigError::Cycle { .. }));
    }

    #[test]
    fn test_bd030_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        dispatch(Commands::Order { file: path }).unwrap();
    }

    #[test]
    fn test_bd030_bind_root_and_named_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        dispatch(Commands::Bind {
            file: path.clone(),
            task: "gripper".to_string(),
            search: None,
            json: true,
        })
        .unwrap();
        cmd_bind(&path, "gripper", Some("eager"), false).unwrap();
    }

    #[test]
    fn test_bd030_bind_wrong_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        let err = cmd_bind(&path, "gripper", Some("tie"), false).unwrap_err();
        assert!(matches!(err, ConfigError::CategoryMismatch { .. }));
    }

    #[test]
    fn test_bd030_log_filter_honors_level_directive() {
        use tracing::level_filters::LevelFilter;
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("trace")).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_bd030_log_filter_invalid_falls_back() {
        use tracing::level_filters::LevelFilter;
        assert_eq!(
            log_filter(Some("bindery=loudest")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_bd030_validate_rejects_too_deep() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blueprint.yaml");
        let mut yaml = String::from("version: \"1.0\"\nname: deep\ncomponents:\n  e0:\n    type: const\n    value: 1\n");
        for i in 1..=config::MAX_REFERENCE_DEPTH {
            yaml.push_str(&format!("  e{i}:\n    type: weighted\n    weight: 1\n    eval: e{}\n", i - 1));
        }
        std::fs::write(&path, yaml).unwrap();
        assert!(matches!(cmd_validate(&path).unwrap_err(), ConfigError::TooDeep { .. }));
        assert!(matches!(
            cmd_bind(&path, "t", Some("e1"), false).unwrap_err(),
            ConfigError::TooDeep { .. }
        ));
    }

    #[test]
    fn test_bd030_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_order(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
