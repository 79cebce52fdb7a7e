use crate::conf::{load_runtime_config, validate_config};
use anyhow::bail;
use std::path::PathBuf;

pub fn check(path: PathBuf, plain: bool, json: bool) -> anyhow::Result<()> {
    let cfg = load_runtime_config(&path)?;
    let report = validate_config(&cfg);

    if json {
        println!("{}", report.to_json()?);
    } else if plain {
        report.render_plain();
    } else {
        report.render_pretty();
    }

    if report.has_errors() {
        bail!(
            "configuration in {} has {} error(s)",
            path.display(),
            report.errors.len()
        );
    }

    if !json {
        println!("✔ Config loaded successfully");
        println!("✔ {} monitors", cfg.monitors.len());
        println!("✔ {} pools", cfg.pools.len());
        println!(
            "✔ {} origins",
            cfg.pools.iter().map(|p| p.origins.len()).sum::<usize>()
        );
        println!("✔ {} load balancers", cfg.load_balancers.len());
        println!(
            "✔ {} rules",
            cfg.load_balancers
                .iter()
                .map(|lb| lb.rules.len())
                .sum::<usize>()
        );
    }

    Ok(())
}
