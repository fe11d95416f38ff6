use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::store::KeyValueStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portal::cep::{CepLookup, ViaCepClient};
use portal::dashboard::{Dashboard, date_label};
use portal::models::{Address, CompleteProfile, ProfileKind, SignUpForm};
use portal::validation::{
    format_cep, format_cnpj, format_cpf, format_phone, format_user_id, validate_cep,
    validate_cnpj, validate_cpf, validate_email, validate_password, validate_phone,
};
use portal::{HttpGateway, Navigation, Portal, PortalConfig, ProfileGateway, Route};

#[derive(Parser, Debug)]
#[command(author, version, about = "Renovar donor portal")]
struct Cli {
    /// Route opened before running the command
    #[arg(long, global = true, default_value = "/")]
    path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new donor account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with a third-party credential
    Google {
        #[arg(long)]
        credential: String,
    },
    Logout,
    /// Show the current session
    Whoami,
    /// Complete a residential profile
    CompleteResidential {
        #[command(flatten)]
        address: AddressArgs,
        #[arg(long)]
        cpf: Option<String>,
        #[arg(long)]
        residents: Option<String>,
    },
    /// Complete a business profile
    CompleteBusiness {
        #[command(flatten)]
        address: AddressArgs,
        #[arg(long)]
        cnpj: Option<String>,
        #[arg(long)]
        company_name: Option<String>,
    },
    Dashboard,
    /// Full donation history
    History,
    Onboarding {
        #[command(subcommand)]
        action: OnboardingAction,
    },
    /// Show where a path leads for the current session
    CheckRoute { target: String },
    Validate { kind: FieldKind, value: String },
    Format { kind: FieldKind, value: String },
    /// Look up a postal code
    Cep { value: String },
}

#[derive(Subcommand, Debug)]
enum OnboardingAction {
    Finish,
    /// Show the introduction again
    Reset,
}

#[derive(Args, Debug)]
struct AddressArgs {
    #[arg(long)]
    phone: String,
    #[arg(long)]
    cep: String,
    #[arg(long)]
    number: String,
    #[arg(long)]
    complement: Option<String>,
    /// Filled from the postal code lookup when omitted
    #[arg(long)]
    street: Option<String>,
    #[arg(long)]
    neighborhood: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FieldKind {
    Email,
    Password,
    Phone,
    Cep,
    Cpf,
    Cnpj,
    UserId,
}

impl AddressArgs {
    async fn into_address(self, lookup: &impl CepLookup) -> Address {
        let mut address = Address {
            cep: format_cep(&self.cep),
            number: self.number,
            complement: self.complement,
            ..Address::default()
        };
        if self.street.is_none() {
            match lookup.lookup(&self.cep).await {
                Some(found) => found.apply_to(&mut address),
                None => println!("Postal code not found, fill the address manually"),
            }
        }
        if let Some(street) = self.street {
            address.street = street;
        }
        if let Some(neighborhood) = self.neighborhood {
            address.neighborhood = neighborhood;
        }
        if let Some(city) = self.city {
            address.city = city;
        }
        if let Some(state) = self.state {
            address.state = state;
        }
        address
    }
}

fn validate(kind: FieldKind, value: &str) -> bool {
    match kind {
        FieldKind::Email => validate_email(value),
        FieldKind::Password => validate_password(value),
        FieldKind::Phone => validate_phone(value),
        FieldKind::Cep => validate_cep(value),
        FieldKind::Cpf => validate_cpf(value),
        FieldKind::Cnpj => validate_cnpj(value),
        FieldKind::UserId => !value.trim().is_empty(),
    }
}

fn format(kind: FieldKind, value: &str) -> String {
    match kind {
        FieldKind::Phone => format_phone(value),
        FieldKind::Cep => format_cep(value),
        FieldKind::Cpf => format_cpf(value),
        FieldKind::Cnpj => format_cnpj(value),
        FieldKind::UserId => format_user_id(value),
        FieldKind::Email | FieldKind::Password => value.trim().to_string(),
    }
}

fn report(navigation: Navigation) {
    match navigation {
        Navigation::Pending => println!("-> (loading)"),
        Navigation::Landed(route) => println!("-> {}", route),
    }
}

fn print_dashboard(dashboard: &Dashboard, full: bool) {
    println!("Hello, {}!", dashboard.greeting);
    if let Some(code) = &dashboard.user_code {
        println!("Donor code: {}", code);
    }
    println!("Total donated: {:.1} kg", dashboard.summary.total_kg());
    let records = if full {
        dashboard.summary.records()
    } else {
        dashboard.summary.recent()
    };
    if records.is_empty() {
        println!("No donations yet");
    }
    for record in records {
        println!("  {}  {:>6.1} kg", date_label(record.date), record.quantity);
    }
}

async fn show_donations<G, S>(portal: &mut Portal<G, S>, target: Route) -> Result<Navigation>
where
    G: ProfileGateway,
    S: KeyValueStore,
{
    let navigation = portal.navigate(target).await?;
    if navigation == Navigation::Landed(target) {
        print_dashboard(&portal.dashboard().await?, target == Route::History);
    }
    Ok(navigation)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Pure helpers need neither the gateway nor the store
    match &cli.command {
        Command::Validate { kind, value } => {
            println!("{}", if validate(*kind, value) { "valid" } else { "invalid" });
            return Ok(());
        }
        Command::Format { kind, value } => {
            println!("{}", format(*kind, value));
            return Ok(());
        }
        _ => {}
    }

    let config = PortalConfig::from_env()?;
    let lookup = ViaCepClient::new(config.cep_lookup_url.clone());

    if let Command::Cep { value } = &cli.command {
        match lookup.lookup(value).await {
            Some(found) => println!(
                "{} {}, {} - {}/{}",
                found.cep, found.street, found.neighborhood, found.city, found.state
            ),
            None => println!("Postal code not found"),
        }
        return Ok(());
    }

    let store = config.open_store().await?;
    let gateway = HttpGateway::new(config.api_base_url.clone());
    let mut portal = Portal::new(gateway, store);
    info!("Using gateway at {}", config.api_base_url);

    let opened = portal.start(&cli.path).await?;

    let navigation = match cli.command {
        Command::Signup {
            name,
            email,
            password,
            confirm,
        } => {
            let form = SignUpForm {
                name,
                email,
                password,
                password_confirmation: confirm,
            };
            let navigation = portal.quick_sign_up(&form).await?;
            println!("Account created, you can sign in now");
            navigation
        }
        Command::Login { email, password } => portal.sign_in(&email, &password).await?,
        Command::Google { credential } => portal.sign_in_with_google(&credential).await?,
        Command::Logout => portal.sign_out().await?,
        Command::Whoami => {
            match portal.current_session() {
                Some(session) => {
                    println!("{} <{}>", session.display_name, session.email);
                    println!("user id: {}", session.user_id);
                    if let Some(kind) = session.account_type {
                        println!("account type: {}", kind);
                    }
                    println!("profile completed: {}", session.profile_completed);
                    if let Some(code) = session.user_code {
                        println!("donor code: {}", format_user_id(&code));
                    }
                }
                None => println!("Not signed in"),
            }
            opened
        }
        Command::CompleteResidential {
            address,
            cpf,
            residents,
        } => {
            let profile = CompleteProfile {
                phone: address.phone.clone(),
                address: address.into_address(&lookup).await,
                kind: ProfileKind::Residential { cpf, residents },
            };
            let (code, navigation) = portal.complete_profile(&profile).await?;
            println!("Profile completed, donor code {}", format_user_id(&code));
            navigation
        }
        Command::CompleteBusiness {
            address,
            cnpj,
            company_name,
        } => {
            let profile = CompleteProfile {
                phone: address.phone.clone(),
                address: address.into_address(&lookup).await,
                kind: ProfileKind::Business { cnpj, company_name },
            };
            let (code, navigation) = portal.complete_profile(&profile).await?;
            println!("Profile completed, donor code {}", format_user_id(&code));
            navigation
        }
        Command::Dashboard => show_donations(&mut portal, Route::Dashboard).await?,
        Command::History => show_donations(&mut portal, Route::History).await?,
        Command::Onboarding { action } => match action {
            OnboardingAction::Finish => portal.finish_onboarding().await?,
            OnboardingAction::Reset => portal.review_onboarding().await?,
        },
        Command::CheckRoute { target } => {
            let route = Route::resolve(&target);
            println!("{} ({:?})", route, route.class());
            portal.navigate(route).await?
        }
        Command::Validate { .. } | Command::Format { .. } | Command::Cep { .. } => opened,
    };

    report(navigation);
    Ok(())
}
