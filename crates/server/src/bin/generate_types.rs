use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        navi::Priority::decl(),
        navi::TaskStatus::decl(),
        navi::TaskStep::decl(),
        navi::Task::decl(),
        navi::CommandAction::decl(),
        navi::ConversationEntry::decl(),
        navi::ConversationContext::decl(),
        navi::DeletedTask::decl(),
        navi::AiInterpretation::decl(),
        navi::AiCommandRequest::decl(),
        navi::AiCommandData::decl(),
        navi::AiCommandResponse::decl(),
        navi::Transcription::decl(),
        navi::ProviderType::decl(),
        navi::LLMConfig::decl(),
        navi::SttConfig::decl(),
        server::error::TranscribeErrorBody::decl(),
        server::routes::health::HealthStatus::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| format!("export {}", decl.trim_start_matches("export ")))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n{body}\n"
    )
}

fn main() -> anyhow::Result<()> {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let types_path = shared_path.join("types.ts");

    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date.");
            return Ok(());
        }
        anyhow::bail!("shared/types.ts is out of date; run `cargo run --bin generate_types`");
    }

    fs::create_dir_all(&shared_path)?;
    fs::write(&types_path, generated)?;
    println!("Wrote {}", types_path.display());
    Ok(())
}
