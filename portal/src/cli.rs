//! Command-line surface for the `loan-portal` binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use loan_portal::domain::admin::{BulkAction, ReasonCode, SortColumn};
use loan_portal::domain::{
    ApplicationId, ApplicationStatus, ApplicationType, DocumentType, RepaymentMethod,
};

/// `loan-portal` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "loan-portal",
    about = "Apply for and review microfinance loans against the portal API",
    version
)]
pub struct CliArgs {
    /// Emit logs as JSON lines.
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in; the password is read from stdin.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account and sign in; the password is read from stdin.
    Register {
        #[arg(long = "first-name")]
        first_name: String,
        #[arg(long = "last-name")]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in profile.
    Whoami,
    /// Change the password; current, new and confirmation are read from
    /// stdin, one per line.
    ChangePassword,
    /// Attach a KYC document to the signed-in profile.
    UploadId {
        #[arg(long = "type", value_name = "DOCUMENT_TYPE")]
        document_type: DocumentType,
        #[arg(value_name = "path")]
        path: PathBuf,
    },
    /// Applicant applications.
    #[command(subcommand)]
    Apps(AppsCommand),
    /// Indicative repayment figures.
    Quote {
        /// Principal in whole currency units.
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        months: u32,
        #[arg(long, default_value = "Monthly")]
        method: RepaymentMethod,
    },
    /// Admin review workflow.
    #[command(subcommand)]
    Admin(AdminCommand),
}

/// Product selector for wizard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Product {
    Sme,
    Payroll,
}

impl From<Product> for ApplicationType {
    fn from(product: Product) -> Self {
        match product {
            Product::Sme => Self::Sme,
            Product::Payroll => Self::Payroll,
        }
    }
}

/// Wizard form input shared by `apps draft` and `apps submit`.
#[derive(Debug, Args)]
pub struct FormArgs {
    #[arg(long, value_enum)]
    pub product: Product,
    /// JSON file holding the form fields in wire shape. Omit to continue
    /// the saved draft unchanged.
    #[arg(long, value_name = "path")]
    pub form: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List own applications.
    List {
        #[arg(long)]
        status: Option<ApplicationStatus>,
        #[arg(long = "type")]
        application_type: Option<ApplicationType>,
    },
    /// Show one application with documents and audit trail.
    Show { id: ApplicationId },
    /// Delete a draft.
    Delete { id: ApplicationId },
    /// Save wizard progress as a backend draft and locally.
    Draft(FormArgs),
    /// Validate, upload documents and submit.
    Submit {
        #[command(flatten)]
        form: FormArgs,
        /// Attachment as `TYPE=path`, e.g. `NATIONAL_ID_FRONT=id.jpg`.
        #[arg(long = "doc", value_name = "TYPE=path", value_parser = parse_attachment)]
        documents: Vec<(DocumentType, PathBuf)>,
    },
    /// Drop the locally saved draft.
    Discard {
        #[arg(long, value_enum)]
        product: Product,
    },
}

/// Filters for admin list and export.
#[derive(Debug, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<ApplicationStatus>,
    #[arg(long = "type")]
    pub application_type: Option<ApplicationType>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,
    /// Column to sort by; repeat to flip direction.
    #[arg(long)]
    pub sort: Vec<SortColumn>,
    /// Zero-based page.
    #[arg(long, default_value_t = 0)]
    pub page: u32,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// List applications across applicants.
    List(FilterArgs),
    /// Show one application.
    Show { id: ApplicationId },
    /// Move one application to a new status.
    Status {
        id: ApplicationId,
        #[arg(long = "to")]
        target: ApplicationStatus,
        #[arg(long)]
        reason: Option<ReasonCode>,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Approve or reject several applications at once.
    Bulk {
        action: BulkAction,
        #[arg(required = true)]
        ids: Vec<ApplicationId>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Set one payload field.
    Edit {
        id: ApplicationId,
        field: String,
        /// New value as JSON; bare words are taken as strings.
        value: String,
    },
    /// Download matching applications as CSV.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_name = "path")]
        out: PathBuf,
    },
}

fn parse_attachment(raw: &str) -> Result<(DocumentType, PathBuf), String> {
    let (kind, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=path, got {raw}"))?;
    let kind = kind.parse::<DocumentType>().map_err(|err| err.to_string())?;
    if path.is_empty() {
        return Err(format!("missing path for {kind}"));
    }
    Ok((kind, PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    //! Argument parsing checks.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn submit_collects_typed_attachments() {
        let args = CliArgs::try_parse_from([
            "loan-portal",
            "apps",
            "submit",
            "--product",
            "sme",
            "--doc",
            "NATIONAL_ID_FRONT=front.jpg",
            "--doc",
            "BUSINESS_REGISTRATION=reg.pdf",
        ])
        .expect("parses");
        let Command::Apps(AppsCommand::Submit { form, documents }) = args.command else {
            panic!("expected apps submit");
        };
        assert_eq!(form.product, Product::Sme);
        assert!(form.form.is_none());
        assert_eq!(
            documents,
            vec![
                (DocumentType::NationalIdFront, PathBuf::from("front.jpg")),
                (DocumentType::BusinessRegistration, PathBuf::from("reg.pdf")),
            ]
        );
    }

    #[rstest]
    #[case("NATIONAL_ID_FRONT")]
    #[case("NATIONAL_ID_FRONT=")]
    #[case("SELFIE=me.jpg")]
    fn malformed_attachments_are_rejected(#[case] raw: &str) {
        assert!(parse_attachment(raw).is_err());
    }

    #[rstest]
    fn bulk_requires_ids() {
        assert!(CliArgs::try_parse_from(["loan-portal", "admin", "bulk", "approve"]).is_err());
    }

    #[rstest]
    fn quote_defaults_to_monthly() {
        let args = CliArgs::try_parse_from([
            "loan-portal",
            "quote",
            "--amount",
            "1000",
            "--months",
            "6",
        ])
        .expect("parses");
        assert!(matches!(
            args.command,
            Command::Quote {
                method: RepaymentMethod::Monthly,
                ..
            }
        ));
    }
}
