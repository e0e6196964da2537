//! Waybill CLI - command-line client for the delivery backend
//!
//! Signs in, keeps the session on disk between invocations and exposes the
//! customer, driver, admin and notification features of the backend.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use waybill_api::watch::intervals;
use waybill_api::{
    watch_location, watch_unread_count, DriverStatusUpdate, Notification, Order, OrderLocation,
    OrderRequest, WaybillApi, CARGO_TYPES,
};
use waybill_core::{
    init_logging, Role, SignUpRequest, WaybillConfig, WaybillError, WaybillResult,
};
use waybill_session::{FileStorage, PageLoad, SessionManager, ViewRegion};

#[derive(Parser)]
#[command(name = "waybill")]
#[command(about = "Command-line client for the Waybill delivery service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Load a page: consume a `?token=` bootstrap token and apply the
    /// sign-in gate and role visibility
    Open {
        /// Absolute URL or a path such as /customer/orders?token=...
        target: String,
    },

    /// Customer orders
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Driver orders, vehicle and status updates
    #[command(subcommand)]
    Driver(DriverCommand),

    /// Route and cargo of an order
    #[command(subcommand)]
    Order(OrderCommand),

    /// Current position of an order
    Track {
        order_id: i64,

        /// Show every reported position
        #[arg(long)]
        history: bool,

        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Notification inbox
    #[command(subcommand)]
    Notifications(NotificationCommand),

    /// Role administration
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum CustomerCommand {
    /// List your orders
    Orders,
    /// Show one order
    Show { order_id: i64 },
    /// Quote a price without ordering
    Quote(OrderArgs),
    /// Place an order
    Create(OrderArgs),
}

#[derive(clap::Args)]
struct OrderArgs {
    /// Cargo type, e.g. GRAIN or STEEL
    #[arg(long)]
    cargo_type: String,

    /// Weight in kilograms
    #[arg(long)]
    weight: f64,

    #[arg(long)]
    from: String,

    #[arg(long)]
    to: String,
}

#[derive(Subcommand)]
enum DriverCommand {
    /// Orders assigned to you
    Orders,
    /// Show one assigned order
    Show { order_id: i64 },
    /// Your vehicle
    Vehicle,
    /// Status names and their ids
    Statuses,
    /// Report a status change, optionally with your position
    Status {
        order_id: i64,

        #[arg(long)]
        status_id: i64,

        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        #[arg(long)]
        comment: Option<String>,
    },
    /// Positions reported for an order
    History { order_id: i64 },
}

#[derive(Subcommand)]
enum OrderCommand {
    Route { order_id: i64 },
    Cargo { order_id: i64 },
}

#[derive(Subcommand)]
enum NotificationCommand {
    /// All notifications
    List,
    /// Only unread notifications
    Unread,
    /// Number of unread notifications
    Count,
    /// Mark one notification read
    Read { notification_id: i64 },
    /// Mark everything read
    ReadAll,
    /// Print the unread count whenever it changes
    Watch,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List role assignments
    Roles,
    /// Give a user a role
    Assign {
        #[arg(long)]
        email: String,

        /// ADMIN, CUSTOMER, DRIVER or SUPPORT_AGENT
        #[arg(long)]
        role: String,
    },
    /// Remove a user's role
    Remove {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = WaybillConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if cli.verbose {
        config.logging.set_level("debug");
    }

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!("Starting Waybill CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Err(error) = run(cli, config).await {
        error.log();
        report_error(&error);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, config: WaybillConfig) -> WaybillResult<()> {
    let storage = Arc::new(FileStorage::new(config.session.storage_path()));
    let session = Arc::new(SessionManager::new(storage, config.session.clone()));
    let api = WaybillApi::new(&config.api, session.clone())?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let outcome = api.auth().sign_in(&email, &password).await?;
            println!("✅ Signed in as {}", outcome.identity.greeting_name());
            println!("➡️  Start at {}", outcome.redirect_to);
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let request = SignUpRequest {
                first_name,
                last_name,
                email,
                password,
            };
            let outcome = api.auth().sign_up(&request).await?;
            println!("✅ Account created, signed in as {}", outcome.identity.greeting_name());
            println!("➡️  Start at {}", outcome.redirect_to);
        }
        Commands::Logout => {
            api.auth().sign_out()?;
            println!("👋 Signed out");
        }
        Commands::Whoami => handle_whoami(&session),
        Commands::Open { target } => handle_open(&api, &session, &target)?,
        Commands::Customer(command) => handle_customer(&api, command).await?,
        Commands::Driver(command) => handle_driver(&api, command).await?,
        Commands::Order(command) => match command {
            OrderCommand::Route { order_id } => {
                let route = api.orders().route(order_id).await?;
                println!(
                    "🗺️  {} → {}",
                    route.start_location.as_deref().unwrap_or("?"),
                    route.end_location.as_deref().unwrap_or("?")
                );
                if let Some(distance) = route.distance {
                    println!("   Distance: {:.1} km", distance);
                }
                if let Some(eta) = route.estimated_time {
                    println!("   Estimated arrival: {}", eta.format("%Y-%m-%d %H:%M UTC"));
                }
            }
            OrderCommand::Cargo { order_id } => {
                let cargo = api.orders().cargo(order_id).await?;
                println!(
                    "📦 {} ({} kg)",
                    cargo.cargo_type.as_deref().unwrap_or("unknown"),
                    cargo.weight.map(|w| format!("{:.0}", w)).unwrap_or_else(|| "?".to_string())
                );
            }
        },
        Commands::Track {
            order_id,
            history,
            watch,
        } => handle_track(&api, &config, order_id, history, watch).await?,
        Commands::Notifications(command) => handle_notifications(&api, &config, command).await?,
        Commands::Admin(command) => handle_admin(&api, command).await?,
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(cli.config.as_deref(), &config, show, init, validate)?,
    }

    Ok(())
}

/// Print an error next to the command that caused it, with what to do next
fn report_error(error: &WaybillError) {
    eprintln!("❌ {}", error);

    if let Some(target) = error.redirect_target() {
        eprintln!("🔐 Sign-in required (page: {}). Run `waybill login --email <you>`.", target);
    }

    if let Some(context) = error.context() {
        for suggestion in &context.recovery_suggestions {
            eprintln!("💡 {}", suggestion);
        }
    }

    if error.is_recoverable() {
        match error.retry_delay_ms() {
            Some(ms) => eprintln!(
                "🔁 This is probably temporary. Retry the same command in about {}s.",
                (ms + 999) / 1000
            ),
            None => eprintln!("🔁 This is probably temporary. Retry the same command."),
        }
    }
}

fn password_or_prompt(password: Option<String>) -> WaybillResult<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn handle_whoami(session: &SessionManager) {
    let Some(identity) = session.identity() else {
        println!("Not signed in");
        return;
    };

    println!("👤 {}", identity.greeting_name());
    if let Some(email) = &identity.email {
        println!("   Email: {}", email);
    }
    if let Some(user_id) = identity.user_id {
        println!("   User id: {}", user_id);
    }
    println!(
        "   Role: {}",
        identity.role.as_ref().map(Role::as_str).unwrap_or("unknown")
    );
    println!("   Home: {}", session.post_login_target());

    if let Some(expires_at) = session.token_claims().and_then(|c| c.expires_at()) {
        println!("   Token expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
    }
}

/// Navigation entries of the web client, tagged the way its markup is
fn navigation_regions() -> Vec<ViewRegion> {
    vec![
        ViewRegion::public("home"),
        ViewRegion::authenticated("notifications"),
        ViewRegion::for_role("create-order", Role::Customer.as_str()),
        ViewRegion::for_role("my-orders", Role::Customer.as_str()),
        ViewRegion::for_role("assigned-orders", Role::Driver.as_str()),
        ViewRegion::for_role("vehicle", Role::Driver.as_str()),
        ViewRegion::for_role("role-management", Role::Admin.as_str()),
        ViewRegion::for_role("support-queue", Role::SupportAgent.as_str()),
        ViewRegion::authenticated("logout"),
    ]
}

fn handle_open(api: &WaybillApi, session: &SessionManager, target: &str) -> WaybillResult<()> {
    let url = match Url::parse(target) {
        Ok(url) => url,
        Err(_) => api.http().url(target)?,
    };

    let mut regions = navigation_regions();
    match session.load_page(&url, &mut regions)? {
        PageLoad::Redirect { from, to } => {
            println!("🔐 {} requires sign-in, redirecting to {}", from.path(), to);
        }
        PageLoad::Render {
            url,
            authenticated,
            role,
        } => {
            println!("📄 {}", url);
            if authenticated {
                println!(
                    "   Signed in as {}",
                    role.as_ref().map(Role::as_str).unwrap_or("unknown role")
                );
            } else {
                println!("   Not signed in");
            }
            let visible: Vec<&str> = regions
                .iter()
                .filter(|r| r.visible)
                .map(|r| r.id.as_str())
                .collect();
            println!("   Menu: {}", visible.join(", "));
        }
    }
    Ok(())
}

fn order_request(args: OrderArgs) -> OrderRequest {
    OrderRequest {
        cargo_type: args.cargo_type.to_uppercase(),
        cargo_weight: args.weight,
        start_location: args.from,
        end_location: args.to,
    }
}

fn print_order(order: &Order) {
    let status = order
        .status
        .as_ref()
        .map(|s| s.status_name.as_str())
        .unwrap_or("UNKNOWN");
    println!(
        "#{:<6} {:<18} {} → {}",
        order.id,
        status,
        order.start_location.as_deref().unwrap_or("?"),
        order.end_location.as_deref().unwrap_or("?")
    );
}

fn print_order_details(order: &Order) {
    print_order(order);
    if let Some(cargo_type) = &order.cargo_type {
        println!(
            "   Cargo: {} ({} kg)",
            cargo_type,
            order.cargo_weight.map(|w| format!("{:.0}", w)).unwrap_or_else(|| "?".to_string())
        );
    }
    if let Some(price) = order.price {
        println!("   Price: {:.2}", price);
    }
    if let Some(driver) = &order.driver_name {
        println!("   Driver: {}", driver);
    }
    if let Some(plate) = &order.vehicle_license_plate {
        println!("   Vehicle: {}", plate);
    }
    if let Some(eta) = order.estimated_delivery_time {
        println!("   Estimated delivery: {}", eta.format("%Y-%m-%d %H:%M UTC"));
    }
}

fn print_location(location: &OrderLocation) {
    let at = location
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    print!("📍 {:.5}, {:.5} at {}", location.latitude, location.longitude, at);
    match &location.status_comment {
        Some(comment) => println!(" ({})", comment),
        None => println!(),
    }
}

async fn handle_customer(api: &WaybillApi, command: CustomerCommand) -> WaybillResult<()> {
    match command {
        CustomerCommand::Orders => {
            let orders = api.customer().list_orders().await?;
            if orders.is_empty() {
                println!("No orders yet. Create one with `waybill customer create`.");
            }
            orders.iter().for_each(print_order);
        }
        CustomerCommand::Show { order_id } => {
            print_order_details(&api.customer().get_order(order_id).await?);
        }
        CustomerCommand::Quote(args) => {
            let request = order_request(args);
            let quote = api.customer().calculate_price(&request).await.map_err(cargo_hint)?;
            println!("💰 {:.2}", quote.price);
            if let Some(distance) = quote.distance {
                println!("   Distance: {:.1} km", distance);
            }
        }
        CustomerCommand::Create(args) => {
            let request = order_request(args);
            let order = api.customer().create_order(&request).await.map_err(cargo_hint)?;
            println!("✅ Order created");
            print_order_details(&order);
        }
    }
    Ok(())
}

/// List the accepted cargo types when the one given was rejected
fn cargo_hint(error: WaybillError) -> WaybillError {
    match error {
        WaybillError::Validation {
            message,
            field,
            context,
        } if field.as_deref() == Some("cargoType") => WaybillError::Validation {
            message,
            field,
            context: context
                .with_suggestion(&format!("Known cargo types: {}", CARGO_TYPES.join(", "))),
        },
        other => other,
    }
}

async fn handle_driver(api: &WaybillApi, command: DriverCommand) -> WaybillResult<()> {
    match command {
        DriverCommand::Orders => {
            let orders = api.driver().list_orders().await?;
            if orders.is_empty() {
                println!("No orders assigned to you");
            }
            orders.iter().for_each(print_order);
        }
        DriverCommand::Show { order_id } => {
            print_order_details(&api.driver().get_order(order_id).await?);
        }
        DriverCommand::Vehicle => {
            let vehicle = api.driver().vehicle().await?;
            println!(
                "🚚 {}",
                vehicle.license_plate.as_deref().unwrap_or("no plate")
            );
            if let Some(capacity) = vehicle.capacity {
                println!("   Capacity: {:.0} kg", capacity);
            }
        }
        DriverCommand::Statuses => {
            for entry in api.driver().statuses().await? {
                match entry.id {
                    Some(id) => println!("{:>3}  {}", id, entry.status_name),
                    None => println!("  -  {}", entry.status_name),
                }
            }
        }
        DriverCommand::Status {
            order_id,
            status_id,
            lat,
            lon,
            comment,
        } => {
            let update = DriverStatusUpdate {
                status_id,
                latitude: lat,
                longitude: lon,
                status_comment: comment,
            };
            let order = api.driver().update_status(order_id, &update).await?;
            println!("✅ Status updated");
            print_order(&order);
        }
        DriverCommand::History { order_id } => {
            let history = api.driver().location_history(order_id).await?;
            if history.is_empty() {
                println!("No positions reported yet");
            }
            history.iter().for_each(print_location);
        }
    }
    Ok(())
}

async fn handle_track(
    api: &WaybillApi,
    config: &WaybillConfig,
    order_id: i64,
    history: bool,
    watch: bool,
) -> WaybillResult<()> {
    if history {
        api.tracking()
            .history(order_id)
            .await?
            .iter()
            .for_each(print_location);
        return Ok(());
    }

    if !watch {
        print_location(&api.tracking().current_location(order_id).await?);
        return Ok(());
    }

    // Fail fast on a missing session instead of polling into the void
    api.tracking().current_location(order_id).await?;

    let (_, location_interval) = intervals(&config.polling);
    let handle = watch_location(api.clone(), order_id, location_interval);
    let mut updates = handle.subscribe();
    println!("Tracking order {}, press Ctrl+C to stop", order_id);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(location) = updates.borrow_and_update().clone() {
                    print_location(&location);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop();
    Ok(())
}

fn print_notification(notification: &Notification) {
    let marker = if notification.is_read { " " } else { "●" };
    let at = notification
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!("{} [{}] {} {}", marker, notification.id, at, notification.message);
}

async fn handle_notifications(
    api: &WaybillApi,
    config: &WaybillConfig,
    command: NotificationCommand,
) -> WaybillResult<()> {
    match command {
        NotificationCommand::List => {
            let inbox = api.notifications().list().await?;
            if inbox.is_empty() {
                println!("📭 No notifications");
            }
            inbox.iter().for_each(print_notification);
        }
        NotificationCommand::Unread => {
            api.notifications()
                .unread()
                .await?
                .iter()
                .for_each(print_notification);
        }
        NotificationCommand::Count => {
            println!("{}", api.notifications().unread_count().await?);
        }
        NotificationCommand::Read { notification_id } => {
            api.notifications().mark_read(notification_id).await?;
            println!("✅ Marked {} as read", notification_id);
        }
        NotificationCommand::ReadAll => {
            api.notifications().mark_all_read().await?;
            println!("✅ All notifications marked as read");
        }
        NotificationCommand::Watch => {
            let first = api.notifications().unread_count().await?;
            println!("🔔 {} unread", first);

            let (notifications_interval, _) = intervals(&config.polling);
            let handle = watch_unread_count(api.clone(), notifications_interval);
            let mut updates = handle.subscribe();
            let mut last = first;

            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let latest = *updates.borrow_and_update();
                        if let Some(count) = latest.filter(|count| *count != last) {
                            println!("🔔 {} unread", count);
                            last = count;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            handle.stop();
        }
    }
    Ok(())
}

async fn handle_admin(api: &WaybillApi, command: AdminCommand) -> WaybillResult<()> {
    match command {
        AdminCommand::Roles => {
            for assignment in api.admin().list_role_assignments().await? {
                println!(
                    "{:<40} {}",
                    assignment.email.as_deref().unwrap_or("-"),
                    assignment.role_name
                );
            }
        }
        AdminCommand::Assign { email, role } => {
            let role = Role::from(role.as_str());
            if let Role::Other(name) = &role {
                eprintln!("⚠️  {} is not a role this client knows, sending it anyway", name);
            }
            api.admin().assign_role(&email, &role).await?;
            println!("✅ {} is now {}", email, role);
        }
        AdminCommand::Remove { email } => {
            api.admin().remove_role(&email).await?;
            println!("✅ Removed role of {}", email);
        }
    }
    Ok(())
}

fn handle_config(
    path: Option<&std::path::Path>,
    config: &WaybillConfig,
    show: bool,
    init: bool,
    validate: bool,
) -> WaybillResult<()> {
    let path = path
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(WaybillConfig::default_path);

    if init {
        WaybillConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {}", path.display());
    }

    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| WaybillError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: waybill_core::ErrorContext::new("cli").with_operation("show_config"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        config.validate()?;
        println!("✅ Configuration is valid");
    }

    if !(init || show || validate) {
        println!("Config file: {}", path.display());
        println!("Session file: {}", config.session.storage_path().display());
    }

    Ok(())
}
