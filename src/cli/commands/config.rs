//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Print what is wrong with `settings`. Returns true when nothing is.
fn report_problems(settings: &Settings) -> bool {
    let problems = settings.problems();
    for problem in &problems {
        Output::list_item(problem);
    }
    problems.is_empty()
}

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
            if !settings.problems().is_empty() {
                Output::warning("This configuration has problems; run 'studycast config check'.");
            }
        }

        ConfigAction::Check => {
            Output::header(&format!("Checking {}", config_path.display()));
            Output::kv("Speakers", &format!(
                "{} / {}",
                settings.script.first_speaker, settings.script.second_speaker
            ));
            Output::kv("Voices", &format!(
                "{} / {}",
                settings.speech.first_voice, settings.speech.second_voice
            ));
            Output::kv("Script model", &settings.generation.script_model);

            if report_problems(&settings) {
                Output::success("Configuration is valid.");
            } else {
                return Err(anyhow::anyhow!("configuration is not valid"));
            }
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path.to_path_buf())?;
                Output::info(&format!("Created default config at {}", config_path.display()));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
            let status = std::process::Command::new(&editor).arg(config_path).status();

            match status {
                Ok(s) if s.success() => {
                    match Settings::load_from(Some(&config_path.to_path_buf())) {
                        Ok(edited) if report_problems(&edited) => Output::success("Config saved."),
                        Ok(_) => Output::warning("Config saved, but generation will refuse to run."),
                        Err(e) => Output::warning(&format!("Config saved but does not parse: {}", e)),
                    }
                }
                Ok(_) => Output::warning(&format!("{} exited with non-zero status.", editor)),
                Err(e) => {
                    Output::error(&format!("Failed to open {}: {}", editor, e));
                    Output::info(&format!("Config file is at: {}", config_path.display()));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
