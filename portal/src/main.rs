//! `loan-portal` entry point: wires settings, local state and the HTTP API
//! into the stores, then runs one command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "command results are written to the terminal"
)]

mod cli;

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use loan_portal::PortalSettings;
use loan_portal::domain::admin::{AdminBoard, AdminQuery, BulkOutcome, TokioSleeper};
use loan_portal::domain::ports::{
    ApplicationsApi, Confirm, DraftStore, FixedConfirm, SessionStore, initialize_session_sync,
};
use loan_portal::domain::{
    Application, ApplicationFilters, ApplicationsStore, AuthStore, ChangePasswordRequest,
    ClearReason, DocumentType, DocumentUpload, LoanQuote, LoginCredentials, PayrollData,
    Registration, SessionChange, SmeData, Wizard, WizardCoordinator, WizardForm,
};
use loan_portal::outbound::http::{GatewayClient, HttpAdminApi, HttpApplicationsApi, HttpAuthApi};
use loan_portal::outbound::storage::{FileDraftStore, FileSessionStore};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use cli::{AdminCommand, AppsCommand, CliArgs, Command, FilterArgs, FormArgs, Product};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to create Tokio runtime")?;
    runtime.block_on(run(args.command))
}

fn init_tracing(json: bool) {
    let builder = fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

async fn run(command: Command) -> Result<()> {
    if let Command::Quote {
        amount,
        months,
        method,
    } = command
    {
        let quote = LoanQuote::compute(amount, months, method)
            .ok_or_else(|| eyre!("amount and term must both be positive"))?;
        print_quote(&quote);
        return Ok(());
    }

    let settings = PortalSettings::load_from_iter([OsString::from("loan-portal")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let portal = Portal::connect(&settings)?;

    match command {
        Command::Login { email } => {
            let password = read_secret("Password").await?;
            let credentials = LoginCredentials::try_from_parts(&email, &password)
                .map_err(|err| eyre!("{err}"))?;
            let user = portal.auth.login(&credentials).await?;
            println!("Signed in as {} ({:?})", user.display_name(), user.role);
        }
        Command::Register {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let registration = Registration {
                first_name,
                last_name,
                email,
                phone_number: phone,
                password: read_secret("Password").await?,
            };
            let user = portal.auth.register(&registration).await?;
            println!("Registered {}", user.display_name());
        }
        Command::Logout => {
            portal.auth.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => {
            let user = portal.auth.load_current_user().await?;
            println!("{} <{}> {:?}", user.display_name(), user.email, user.role);
            for document in &user.documents {
                let verified = if document.verified { "verified" } else { "pending" };
                println!("  {} {} ({verified})", document.document_type, document.file_name);
            }
        }
        Command::ChangePassword => {
            let current = read_secret("Current password").await?;
            let new = read_secret("New password").await?;
            let confirm = read_secret("Confirm new password").await?;
            let request = ChangePasswordRequest::new(&current, &new, &confirm);
            portal.auth.change_password(&request).await?;
            println!("Password changed");
        }
        Command::UploadId {
            document_type,
            path,
        } => {
            let file = read_upload(&path).await?;
            let document = portal.auth.upload_user_document(file, document_type).await?;
            println!("Uploaded {} as {}", document.file_name, document.document_type);
        }
        Command::Apps(command) => portal.apps_command(command).await?,
        Command::Admin(command) => portal.admin_command(command, &settings).await?,
        Command::Quote { .. } => {}
    }
    Ok(())
}

/// Stores and adapters shared by every command.
struct Portal {
    sessions: Arc<FileSessionStore>,
    drafts: Arc<FileDraftStore>,
    auth: AuthStore,
    applications: ApplicationsStore,
    applications_api: Arc<dyn ApplicationsApi>,
    admin_api: Arc<HttpAdminApi>,
}

impl Portal {
    fn connect(settings: &PortalSettings) -> Result<Self> {
        let state_dir = settings.state_dir()?;
        let sessions = Arc::new(FileSessionStore::open(&state_dir)?);
        let drafts = Arc::new(FileDraftStore::open(&state_dir)?);
        debug!(path = %sessions.path(), "session store opened");

        let _watcher = sessions.spawn_watcher(settings.session_poll());
        let _sync = initialize_session_sync(sessions.as_ref(), |change| match change {
            SessionChange::Cleared(ClearReason::Expired) => {
                warn!("session expired; sign in again");
            }
            SessionChange::External => info!("session changed in another window"),
            other => debug!(?other, "session changed"),
        });

        let gateway = Arc::new(
            GatewayClient::new(
                settings.api_base_url()?,
                settings.request_timeout(),
                sessions.clone(),
            )
            .wrap_err("failed to build HTTP client")?,
        );
        let applications_api: Arc<dyn ApplicationsApi> =
            Arc::new(HttpApplicationsApi::new(gateway.clone()));
        Ok(Self {
            auth: AuthStore::new(Arc::new(HttpAuthApi::new(gateway.clone())), sessions.clone()),
            applications: ApplicationsStore::new(applications_api.clone()),
            applications_api,
            admin_api: Arc::new(HttpAdminApi::new(gateway)),
            sessions,
            drafts,
        })
    }

    fn coordinator(&self) -> WizardCoordinator {
        WizardCoordinator::new(self.applications_api.clone(), self.drafts.clone())
    }

    async fn apps_command(&self, command: AppsCommand) -> Result<()> {
        match command {
            AppsCommand::List {
                status,
                application_type,
            } => {
                let filters = ApplicationFilters {
                    status,
                    application_type,
                    ..ApplicationFilters::default()
                };
                let applications = self.applications.fetch_applications(filters).await?;
                print_rows(&applications);
            }
            AppsCommand::Show { id } => {
                let application = self.applications.fetch_application_by_id(id).await?;
                print_application(&application)?;
            }
            AppsCommand::Delete { id } => {
                self.applications.delete_application(id).await?;
                println!("Deleted {id}");
            }
            AppsCommand::Draft(form) => match form.product {
                Product::Sme => self.save_draft::<SmeData>(&form).await?,
                Product::Payroll => self.save_draft::<PayrollData>(&form).await?,
            },
            AppsCommand::Submit { form, documents } => match form.product {
                Product::Sme => self.submit::<SmeData>(&form, &documents).await?,
                Product::Payroll => self.submit::<PayrollData>(&form, &documents).await?,
            },
            AppsCommand::Discard { product } => {
                self.drafts.clear(product.into())?;
                println!("Local draft discarded");
            }
        }
        Ok(())
    }

    async fn load_wizard<F>(&self, args: &FormArgs) -> Result<Wizard<F>>
    where
        F: WizardForm + DeserializeOwned,
    {
        let clock = Arc::new(DefaultClock);
        let mut wizard = match self.coordinator().resume::<F>(clock.clone())? {
            Some(wizard) => wizard,
            None => Wizard::new(clock),
        };
        if let Some(path) = &args.form {
            let bytes = tokio::fs::read(path)
                .await
                .wrap_err_with(|| format!("failed to read form at {}", path.display()))?;
            *wizard.form_mut() = serde_json::from_slice(&bytes)
                .wrap_err_with(|| format!("failed to parse form at {}", path.display()))?;
        }
        Ok(wizard)
    }

    async fn save_draft<F>(&self, args: &FormArgs) -> Result<()>
    where
        F: WizardForm + DeserializeOwned,
    {
        let mut wizard = self.load_wizard::<F>(args).await?;
        let id = self.coordinator().save_draft(&mut wizard).await?;
        println!("Draft {id} saved at step \"{}\"", wizard.step());
        Ok(())
    }

    async fn submit<F>(&self, args: &FormArgs, documents: &[(DocumentType, PathBuf)]) -> Result<()>
    where
        F: WizardForm + DeserializeOwned,
    {
        let mut wizard = self.load_wizard::<F>(args).await?;
        for (kind, path) in documents {
            wizard.attach(*kind, read_upload(path).await?)?;
        }
        if let Some(quote) = wizard.quote() {
            print_quote(&quote);
        }
        let receipt = self.coordinator().submit(&mut wizard).await?;
        println!(
            "Application {} is now {}",
            receipt.application.id, receipt.application.status
        );
        for kind in &receipt.uploaded {
            println!("  uploaded {kind}");
        }
        for (kind, reason) in &receipt.optional_failures {
            println!("  skipped {kind}: {reason}");
        }
        Ok(())
    }

    fn admin_board(&self, settings: &PortalSettings) -> Result<AdminBoard> {
        let session = self.sessions.load().ok_or_else(|| eyre!("not signed in"))?;
        if !session.user.role.is_admin() {
            return Err(eyre!("{} is not an admin", session.user.email));
        }
        Ok(AdminBoard::new(
            self.admin_api.clone(),
            session.user.role,
            Arc::new(TokioSleeper),
            settings.admin_debounce(),
        ))
    }

    async fn admin_command(&self, command: AdminCommand, settings: &PortalSettings) -> Result<()> {
        let board = self.admin_board(settings)?;
        match command {
            AdminCommand::List(filters) => {
                board.change_query(|query| apply_filters(query, &filters)).await?;
                let state = board.snapshot();
                print_rows(&state.rows);
                println!(
                    "page {} of {} ({} total)",
                    state.page.page + 1,
                    state.page.total_pages.max(1),
                    state.page.total_items
                );
            }
            AdminCommand::Show { id } => {
                let application = board.open(id).await?;
                print_application(&application)?;
            }
            AdminCommand::Status {
                id,
                target,
                reason,
                comment,
            } => {
                board.open(id).await?;
                let mut form = board.status_form()?;
                form.set_target(target);
                form.set_reason(reason);
                form.set_comment(comment);
                let application = board.change_status(id, &form).await?;
                println!("{id} is now {}", application.status);
            }
            AdminCommand::Bulk { action, ids, yes } => {
                for id in ids {
                    board.toggle_selected(id);
                }
                let confirm: Box<dyn Confirm> = if yes {
                    Box::new(FixedConfirm(true))
                } else {
                    Box::new(StdinConfirm)
                };
                match board.bulk(action, confirm.as_ref()).await? {
                    BulkOutcome::NothingSelected => println!("Nothing selected"),
                    BulkOutcome::Cancelled => println!("Cancelled"),
                    BulkOutcome::Completed { count } => println!("Updated {count} applications"),
                    BulkOutcome::PartiallyFailed { warning } => eprintln!("{warning}"),
                }
            }
            AdminCommand::Edit { id, field, value } => {
                board.open(id).await?;
                let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
                board.edit_field(&field, value).await?;
                println!("Updated {field} on {id}");
            }
            AdminCommand::Export { filters, out } => {
                board.change_query(|query| apply_filters(query, &filters)).await?;
                let csv = board.export_csv().await?;
                tokio::fs::write(&out, &csv)
                    .await
                    .wrap_err_with(|| format!("failed to write {}", out.display()))?;
                println!("Wrote {} bytes to {}", csv.len(), out.display());
            }
        }
        Ok(())
    }
}

fn apply_filters(query: &mut AdminQuery, filters: &FilterArgs) {
    query.set_search(filters.search.as_deref());
    query.set_status(filters.status);
    query.set_application_type(filters.application_type);
    query.set_date_range(filters.from, filters.to);
    for column in &filters.sort {
        query.toggle_sort(*column);
    }
    query.set_page(filters.page);
}

/// Reads yes/no answers from the terminal.
struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = format!("{prompt} [y/N] ");
        let answer = tokio::task::spawn_blocking(move || prompt_line(&prompt)).await;
        matches!(
            answer,
            Ok(Ok(line)) if matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        )
    }
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

async fn read_secret(label: &'static str) -> Result<Zeroizing<String>> {
    let line = tokio::task::spawn_blocking(move || prompt_line(&format!("{label}: ")))
        .await
        .wrap_err("stdin reader panicked")??;
    let line = Zeroizing::new(line);
    Ok(Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_owned()))
}

async fn read_upload(path: &Path) -> Result<DocumentUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| eyre!("{} has no usable file name", path.display()))?;
    Ok(DocumentUpload::new(name, bytes))
}

fn print_rows(applications: &[Application]) {
    if applications.is_empty() {
        println!("No applications");
        return;
    }
    for application in applications {
        println!(
            "{}  {:<8} {:<13} {:<24} {}",
            application.id,
            application.application_type,
            application.status,
            application.applicant_name.as_deref().unwrap_or("-"),
            application.created_at.date_naive()
        );
    }
}

fn print_application(application: &Application) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(application)?);
    Ok(())
}

fn print_quote(quote: &LoanQuote) {
    println!(
        "{} x {} = {} (interest {})",
        quote.installment_count,
        quote.installment_amount,
        quote.total_repayment,
        quote.total_interest
    );
}
