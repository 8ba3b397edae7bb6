//! Prompt Workbench desktop app.
//!
//! One window, five mode forms, a history sidebar. Each action runs one
//! pipeline to completion before the interface accepts the next one; there
//! are no overlapping runs within a session.

use eframe::egui;
use pipelines::executor::{
    run_text_pipeline, run_voice_pipeline, PipelineError, TextRequest, VoiceRequest,
};
use pipelines::spec::{self, text_mode_spec};
use providers::{OpenAIClient, WhisperClient};
use services::ArtifactStore;
use shared::history::{Mode, SessionContext};
use shared::settings::AssistantSettings;
use std::fs;
use std::path::Path;

mod state;
mod templates;

use state::{Feedback, Forms};

fn main() -> eframe::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Missing credential is fatal before any pipeline is reachable.
    let settings = match AssistantSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let store = match ArtifactStore::open(settings.content_dir.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Prompt Workbench",
        options,
        Box::new(move |_cc| Box::new(WorkbenchApp::new(settings, store, runtime))),
    )
}

struct WorkbenchApp {
    runtime: tokio::runtime::Runtime,
    store: ArtifactStore,
    history: SessionContext,
    completion: OpenAIClient,
    transcription: WhisperClient,
    active_mode: Mode,
    forms: Forms,
    feedback: Option<Feedback>,
}

impl WorkbenchApp {
    fn new(settings: AssistantSettings, store: ArtifactStore, runtime: tokio::runtime::Runtime) -> Self {
        let completion = OpenAIClient::new(&settings.api_key, &settings.completion_model);
        let transcription = WhisperClient::new(&settings.api_key, &settings.transcription_model);
        Self {
            runtime,
            store,
            history: SessionContext::new(),
            completion,
            transcription,
            active_mode: Mode::Build,
            forms: Forms::default(),
            feedback: None,
        }
    }

    // ── Pipeline dispatch ────────────────────────────────────────────

    fn run_text_mode(&mut self, mode: Mode) {
        let Some(mode_spec) = text_mode_spec(mode) else {
            return;
        };
        let (values, filename) = match mode {
            Mode::Build => (
                vec![self.forms.build_prompt.clone()],
                self.forms.build_filename.clone(),
            ),
            Mode::Modify => (
                vec![
                    self.forms.modify_code.clone(),
                    self.forms.modify_request.clone(),
                ],
                self.forms.modify_filename.clone(),
            ),
            Mode::Edit => (
                vec![
                    self.forms.edit_content.clone(),
                    self.forms.edit_request.clone(),
                ],
                self.forms.edit_filename.clone(),
            ),
            Mode::Ask => (
                vec![self.forms.ask_question.clone()],
                self.forms.ask_filename.clone(),
            ),
            Mode::Voice => return,
        };
        let request = TextRequest { values, filename };

        let runtime = &self.runtime;
        let completion = &self.completion;
        let store = &self.store;
        let history = &mut self.history;
        let result = runtime.block_on(run_text_pipeline(
            mode_spec, &request, completion, store, history,
        ));
        self.feedback = Some(feedback_from(result));
    }

    fn run_voice_mode(&mut self) {
        let (audio_name, audio_bytes) = self
            .forms
            .voice_audio
            .clone()
            .unwrap_or((String::new(), Vec::new()));
        let request = VoiceRequest {
            audio_name,
            audio_bytes,
            filename: self.forms.voice_filename.clone(),
        };

        let runtime = &self.runtime;
        let completion = &self.completion;
        let transcription = &self.transcription;
        let store = &self.store;
        let history = &mut self.history;
        let result = runtime.block_on(run_voice_pipeline(
            &request,
            completion,
            transcription,
            store,
            history,
        ));
        self.feedback = Some(feedback_from(result));
    }

    // ── Sidebar ──────────────────────────────────────────────────────

    fn show_sidebar(&self, ui: &mut egui::Ui) {
        ui.heading("🧠 Prompt Workbench");
        ui.label("Build, modify, edit, ask, or speak.");
        ui.separator();

        ui.strong("📜 History");
        if self.history.is_empty() {
            ui.weak("No items yet. Run something on the right.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_source("history_scroll")
            .show(ui, |ui| {
                // Newest first is purely presentational.
                for record in self.history.records().iter().rev() {
                    let file = record
                        .path
                        .as_deref()
                        .and_then(Path::file_name)
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "—".to_string());
                    ui.label(format!(
                        "{} — {}\n{}\n`{}`",
                        record.mode.display_name(),
                        record.timestamp,
                        record.prompt_preview(60),
                        file,
                    ));
                    ui.separator();
                }
            });
    }

    // ── Mode forms ───────────────────────────────────────────────────

    fn show_build_form(&mut self, ui: &mut egui::Ui) {
        egui::ComboBox::from_label("Quick template")
            .selected_text(
                self.forms
                    .template_choice
                    .and_then(|i| templates::TEMPLATES.get(i))
                    .map(|t| t.name)
                    .unwrap_or("— None —"),
            )
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut self.forms.template_choice, None, "— None —");
                for (i, template) in templates::TEMPLATES.iter().enumerate() {
                    if ui
                        .selectable_value(&mut self.forms.template_choice, Some(i), template.name)
                        .clicked()
                    {
                        self.forms.build_prompt = template.prompt.to_string();
                    }
                }
            });

        ui.label(spec::BUILD.fields[0].label);
        ui.add(
            egui::TextEdit::multiline(&mut self.forms.build_prompt)
                .desired_rows(8)
                .desired_width(f32::INFINITY)
                .hint_text("e.g., Build a Python CLI that asks for name and age, then prints a greeting."),
        );
        ui.horizontal(|ui| {
            ui.label("File name");
            ui.text_edit_singleline(&mut self.forms.build_filename);
        });

        if ui.button("Generate Code").clicked() {
            self.run_text_mode(Mode::Build);
        }
    }

    fn show_modify_form(&mut self, ui: &mut egui::Ui) {
        ui.label(spec::MODIFY.fields[0].label);
        ui.add(
            egui::TextEdit::multiline(&mut self.forms.modify_code)
                .desired_rows(10)
                .desired_width(f32::INFINITY)
                .code_editor(),
        );
        ui.label(spec::MODIFY.fields[1].label);
        ui.add(
            egui::TextEdit::multiline(&mut self.forms.modify_request)
                .desired_rows(5)
                .desired_width(f32::INFINITY)
                .hint_text("e.g., Add login with username/password and save users to a JSON file."),
        );
        ui.horizontal(|ui| {
            ui.label("New file name");
            ui.text_edit_singleline(&mut self.forms.modify_filename);
        });

        if ui.button("Apply Changes").clicked() {
            self.run_text_mode(Mode::Modify);
        }
    }

    fn show_edit_form(&mut self, ui: &mut egui::Ui) {
        ui.label(spec::EDIT.fields[0].label);
        ui.add(
            egui::TextEdit::multiline(&mut self.forms.edit_content)
                .desired_rows(10)
                .desired_width(f32::INFINITY),
        );
        ui.label(spec::EDIT.fields[1].label);
        ui.add(
            egui::TextEdit::multiline(&mut self.forms.edit_request)
                .desired_rows(5)
                .desired_width(f32::INFINITY)
                .hint_text("e.g., Rewrite to be more professional and concise."),
        );
        ui.horizontal(|ui| {
            ui.label("Save edited content as");
            ui.text_edit_singleline(&mut self.forms.edit_filename);
        });

        if ui.button("Apply Edit").clicked() {
            self.run_text_mode(Mode::Edit);
        }
    }

    fn show_ask_form(&mut self, ui: &mut egui::Ui) {
        ui.label(spec::ASK.fields[0].label);
        ui.add(
            egui::TextEdit::multiline(&mut self.forms.ask_question)
                .desired_rows(6)
                .desired_width(f32::INFINITY)
                .hint_text("e.g., What's the current time in New York?"),
        );
        ui.horizontal(|ui| {
            ui.label("Save answer as (optional, leave blank to skip saving)");
            ui.text_edit_singleline(&mut self.forms.ask_filename);
        });

        if ui.button("Get Answer").clicked() {
            self.run_text_mode(Mode::Ask);
        }
    }

    fn show_voice_form(&mut self, ui: &mut egui::Ui) {
        ui.label("Upload a short voice note (WAV/MP3/M4A). It will be transcribed and answered.");

        ui.horizontal(|ui| {
            if ui.button("Choose audio file…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Audio", &["wav", "mp3", "m4a"])
                    .pick_file()
                {
                    match fs::read(&path) {
                        Ok(bytes) => {
                            let name = path
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| "audio".to_string());
                            self.forms.voice_audio = Some((name, bytes));
                        }
                        Err(e) => {
                            self.feedback = Some(Feedback::Failed(format!(
                                "Could not read {}: {e}",
                                path.display()
                            )));
                        }
                    }
                }
            }
            match &self.forms.voice_audio {
                Some((name, bytes)) => {
                    ui.label(format!("{name} ({} KiB)", bytes.len() / 1024));
                }
                None => {
                    ui.weak("no file selected");
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Save transcript as");
            ui.text_edit_singleline(&mut self.forms.voice_filename);
        });

        if ui.button("Transcribe & Answer").clicked() {
            self.run_voice_mode();
        }
    }

    // ── Feedback ─────────────────────────────────────────────────────

    fn show_feedback(&self, ui: &mut egui::Ui) {
        let Some(feedback) = &self.feedback else {
            return;
        };
        ui.separator();
        match feedback {
            Feedback::Rejected(message) => {
                ui.colored_label(egui::Color32::YELLOW, message);
            }
            Feedback::Failed(message) => {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("❌ {message}"));
            }
            Feedback::Report(report) => {
                if let Some(transcript) = &report.transcript {
                    ui.strong("🗣 Transcript");
                    egui::ScrollArea::vertical()
                        .id_source("transcript_scroll")
                        .max_height(120.0)
                        .show(ui, |ui| {
                            ui.monospace(transcript);
                        });
                }

                ui.strong("📝 Result");
                egui::ScrollArea::vertical()
                    .id_source("result_scroll")
                    .max_height(260.0)
                    .show(ui, |ui| {
                        ui.monospace(&report.text);
                    });

                if report.degraded {
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        "The completion call failed; the text above is the error message.",
                    );
                }

                if let Some(path) = &report.saved_path {
                    ui.colored_label(
                        egui::Color32::LIGHT_GREEN,
                        format!("✅ Saved to {}", path.display()),
                    );
                    ui.horizontal(|ui| {
                        if ui.button("Open file").clicked() {
                            if let Err(e) = open::that(path) {
                                tracing::warn!(error = %e, "could not open artifact");
                            }
                        }
                        if ui.button("Show in folder").clicked() {
                            if let Some(parent) = path.parent() {
                                if let Err(e) = open::that(parent) {
                                    tracing::warn!(error = %e, "could not open folder");
                                }
                            }
                        }
                    });
                }
                if let Some(error) = &report.save_error {
                    ui.colored_label(
                        egui::Color32::LIGHT_RED,
                        format!("❌ Failed to save file: {error}"),
                    );
                }
            }
        }
    }
}

fn feedback_from(result: Result<pipelines::executor::RunReport, PipelineError>) -> Feedback {
    match result {
        Ok(report) => Feedback::Report(report),
        Err(PipelineError::Rejected(message)) => Feedback::Rejected(message),
        Err(e) => Feedback::Failed(e.to_string()),
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("sidebar")
            .default_width(260.0)
            .show(ctx, |ui| {
                self.show_sidebar(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for &mode in Mode::all() {
                    if ui
                        .selectable_label(self.active_mode == mode, mode.display_name())
                        .clicked()
                        && self.active_mode != mode
                    {
                        self.active_mode = mode;
                        self.feedback = None;
                    }
                }
            });
            ui.separator();

            match self.active_mode {
                Mode::Build => self.show_build_form(ui),
                Mode::Modify => self.show_modify_form(ui),
                Mode::Edit => self.show_edit_form(ui),
                Mode::Ask => self.show_ask_form(ui),
                Mode::Voice => self.show_voice_form(ui),
            }

            self.show_feedback(ui);
        });
    }
}
