use std::error::Error;
use std::path::PathBuf;
use std::process::Command;

use clap::Args;
use serde::Serialize;

use vort_build::InstallInfo;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Installation manifest to check.
    #[arg(long)]
    pub install: PathBuf,
    /// Emit only JSON without additional context.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(args: &DoctorArgs) -> Result<(), Box<dyn Error>> {
    let report = diagnose(args)?;
    let rendered = serde_json::to_string_pretty(&report)?;
    if args.quiet {
        println!("{rendered}");
    } else {
        println!("vort-sim doctor status: {}", report.status);
        println!("{rendered}");
    }
    if report.status != "ok" {
        return Err("one or more checks failed".into());
    }
    Ok(())
}

fn diagnose(args: &DoctorArgs) -> Result<DoctorReport, Box<dyn Error>> {
    let mut checks = Vec::new();

    let install = match InstallInfo::load(&args.install) {
        Ok(install) => {
            checks.push(DoctorCheck {
                name: "install manifest".into(),
                ok: true,
                detail: args.install.display().to_string(),
            });
            Some(install)
        }
        Err(err) => {
            checks.push(DoctorCheck {
                name: "install manifest".into(),
                ok: false,
                detail: err.to_string(),
            });
            None
        }
    };

    if let Some(install) = &install {
        checks.push(check_compiler(&install.compiler));
        let header = install.solver_header();
        checks.push(DoctorCheck {
            name: "solver header".into(),
            ok: header.is_file(),
            detail: header.display().to_string(),
        });
        checks.push(DoctorCheck {
            name: "solver library directory".into(),
            ok: install.lib_dir.is_dir(),
            detail: install.lib_dir.display().to_string(),
        });
        for dir in &install.include_dirs {
            checks.push(DoctorCheck {
                name: "include directory".into(),
                ok: dir.is_dir(),
                detail: dir.display().to_string(),
            });
        }
        for dir in &install.library_dirs {
            checks.push(DoctorCheck {
                name: "library directory".into(),
                ok: dir.is_dir(),
                detail: dir.display().to_string(),
            });
        }
    }

    let status = if checks.iter().all(|check| check.ok) {
        "ok"
    } else {
        "needs-attention"
    };
    Ok(DoctorReport {
        status: status.into(),
        checks,
    })
}

fn check_compiler(compiler: &str) -> DoctorCheck {
    match Command::new(compiler).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let first_line = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("")
                .to_string();
            DoctorCheck {
                name: "compiler".into(),
                ok: true,
                detail: first_line,
            }
        }
        Ok(_) => DoctorCheck {
            name: "compiler".into(),
            ok: false,
            detail: format!("{compiler} --version exited non-zero"),
        },
        Err(err) => DoctorCheck {
            name: "compiler".into(),
            ok: false,
            detail: format!("{compiler}: {err}"),
        },
    }
}
