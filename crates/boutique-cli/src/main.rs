// ============================================================================
// boutique — terminal storefront client
// ============================================================================
// Usage:
//   boutique products [--featured] [--category ID] [--limit N]
//   boutique product <ID>                    Show one product
//   boutique categories                      List categories
//   boutique cart show|add|remove|set|clear  Manage the local cart
//   boutique login <EMAIL> [--admin]         Sign in (token stored locally)
//   boutique register ...                    Create an account and sign in
//   boutique checkout                        Hand the cart to the processor
//   boutique verify <SESSION_ID>             Verify a payment session
//   boutique admin ...                       Product/category CRUD (ADMIN role)
// ============================================================================

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use boutique_core::api::auth::Registration;
use boutique_core::api::catalog::{CategoryPayload, CategoryRef, ProductPayload};
use boutique_core::{
    ApiClient, CartStore, CheckoutFlow, CheckoutState, LocalStore, Product, RouteAccess,
    SessionStore, ROLE_ADMIN,
};

/// Boutique storefront client
#[derive(Parser)]
#[command(name = "boutique", version, about = "Browse, shop, and manage the boutique catalog")]
struct Cli {
    /// Path to the local store file (default: ~/.boutique/boutique.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Products {
        /// Only featured products
        #[arg(long)]
        featured: bool,

        /// Filter by category id
        #[arg(long)]
        category: Option<i64>,

        /// Maximum number of results (only with --category)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one product
    Product { id: i64 },

    /// List categories
    Categories,

    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },

    /// Sign in with email and password
    Login {
        email: String,

        #[arg(long)]
        password: String,

        /// Use the admin login endpoint
        #[arg(long)]
        admin: bool,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        nom: String,

        #[arg(long)]
        prenom: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        telephone: String,

        #[arg(long)]
        password: String,
    },

    /// Discard the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Create a payment session from the cart
    Checkout,

    /// Verify a payment session after the processor redirect
    Verify { session_id: String },

    /// Product and category management (requires the ADMIN role)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum CartCommands {
    /// Show cart contents and subtotal
    Show,

    /// Add a product to the cart
    Add {
        product_id: i64,

        #[arg(long, default_value = "1")]
        quantity: u32,
    },

    /// Remove a product from the cart
    Remove { product_id: i64 },

    /// Set the quantity of a cart entry (0 removes it)
    Set { product_id: i64, quantity: u32 },

    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create a product
    AddProduct {
        #[arg(long)]
        nom: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        prix: f64,

        #[arg(long)]
        stock: u32,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long)]
        featured: bool,

        /// Category id the product belongs to
        #[arg(long)]
        category: i64,
    },

    /// Update a product (all fields are replaced)
    UpdateProduct {
        id: i64,

        #[arg(long)]
        nom: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        prix: f64,

        #[arg(long)]
        stock: u32,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long)]
        featured: bool,

        #[arg(long)]
        category: i64,
    },

    /// Delete a product
    DeleteProduct { id: i64 },

    /// Create a category
    AddCategory {
        #[arg(long)]
        nom: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Update a category
    UpdateCategory {
        id: i64,

        #[arg(long)]
        nom: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a category
    DeleteCategory { id: i64 },
}

struct App {
    api: Arc<ApiClient>,
    store: Arc<LocalStore>,
}

impl App {
    fn open(db_path: Option<&str>) -> Result<Self> {
        let store = Arc::new(LocalStore::open(db_path)?);
        let api = Arc::new(ApiClient::new(Arc::clone(&store)));
        Ok(Self { api, store })
    }

    /// Restore the stored session, if any.
    async fn session(&self) -> SessionStore {
        let mut session = SessionStore::new(Arc::clone(&self.api), Arc::clone(&self.store));
        session.restore().await;
        session
    }

    /// Restore the session and require the admin role.
    async fn admin_session(&self) -> Result<SessionStore> {
        let session = self.session().await;
        match session.guard(Some(ROLE_ADMIN)) {
            RouteAccess::Granted => Ok(session),
            RouteAccess::Denied | RouteAccess::Pending => {
                bail!("This command requires an admin session. Run: boutique login <EMAIL> --admin")
            }
        }
    }

    fn cart(&self) -> CartStore {
        CartStore::load(Arc::clone(&self.store))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("boutique_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let app = App::open(cli.db_path.as_deref())?;

    match cli.command {
        Commands::Products {
            featured,
            category,
            limit,
        } => cmd_products(&app, featured, category, limit).await,
        Commands::Product { id } => cmd_product(&app, id).await,
        Commands::Categories => cmd_categories(&app).await,
        Commands::Cart { command } => cmd_cart(&app, command).await,
        Commands::Login {
            email,
            password,
            admin,
        } => cmd_login(&app, &email, &password, admin).await,
        Commands::Register {
            nom,
            prenom,
            email,
            telephone,
            password,
        } => {
            cmd_register(
                &app,
                Registration {
                    nom,
                    prenom,
                    email,
                    telephone,
                    password,
                },
            )
            .await
        }
        Commands::Logout => cmd_logout(&app).await,
        Commands::Whoami => cmd_whoami(&app).await,
        Commands::Checkout => cmd_checkout(&app).await,
        Commands::Verify { session_id } => cmd_verify(&app, &session_id).await,
        Commands::Admin { command } => cmd_admin(&app, command).await,
    }
}

// ============================================================================
// Catalog
// ============================================================================

fn print_product_row(product: &Product) {
    println!(
        "{:<6}  {:<30}  {:>8.2}  {:>6}  {}",
        product.id,
        product.nom.chars().take(30).collect::<String>(),
        product.prix,
        product.quantite_stock,
        product.categorie.nom
    );
}

async fn cmd_products(
    app: &App,
    featured: bool,
    category: Option<i64>,
    limit: Option<u32>,
) -> Result<()> {
    if featured && category.is_some() {
        bail!("--featured and --category cannot be combined");
    }
    if limit.is_some() && category.is_none() {
        bail!("--limit requires --category");
    }

    let products = if featured {
        app.api.fetch_featured_products().await?
    } else if let Some(category_id) = category {
        app.api.fetch_products_by_category(category_id, limit).await?
    } else {
        app.api.fetch_products().await?
    };

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    println!(
        "{:<6}  {:<30}  {:>8}  {:>6}  {}",
        "ID", "NAME", "PRICE", "STOCK", "CATEGORY"
    );
    println!("{}", "-".repeat(70));
    for product in &products {
        print_product_row(product);
    }
    println!("\nTotal: {} products", products.len());
    Ok(())
}

async fn cmd_product(app: &App, id: i64) -> Result<()> {
    let product = app.api.fetch_product(id).await?;

    println!("{} (#{})", product.nom, product.id);
    println!("  Price:    {:.2}", product.prix);
    println!("  Stock:    {}", product.quantite_stock);
    println!("  Category: {}", product.categorie.nom);
    if let Some(rating) = product.rating {
        println!("  Rating:   {:.1}/5", rating);
    }
    if product.featured {
        println!("  Featured");
    }
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }
    Ok(())
}

async fn cmd_categories(app: &App) -> Result<()> {
    let categories = app.api.fetch_categories().await?;
    if categories.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    for category in &categories {
        match &category.description {
            Some(description) => println!("{:<6}  {:<24}  {}", category.id, category.nom, description),
            None => println!("{:<6}  {}", category.id, category.nom),
        }
    }
    Ok(())
}

// ============================================================================
// Cart
// ============================================================================

async fn cmd_cart(app: &App, command: CartCommands) -> Result<()> {
    let mut cart = app.cart();

    match command {
        CartCommands::Show => {
            if cart.is_empty() {
                println!("Your cart is empty.");
                return Ok(());
            }
            println!("{:<6}  {:<30}  {:>4}  {:>10}", "ID", "NAME", "QTY", "TOTAL");
            println!("{}", "-".repeat(58));
            for item in cart.items() {
                println!(
                    "{:<6}  {:<30}  {:>4}  {:>10.2}",
                    item.product.id,
                    item.product.nom.chars().take(30).collect::<String>(),
                    item.quantity,
                    item.line_total()
                );
            }
            println!("\n{} items, subtotal {:.2}", cart.count(), cart.subtotal());
        }
        CartCommands::Add {
            product_id,
            quantity,
        } => {
            // Fetch a fresh snapshot so the stock ceiling is current.
            let product = app.api.fetch_product(product_id).await?;
            cart.add_item(&product, quantity)?;
            println!("Added {} x{} to cart.", product.nom, quantity);
        }
        CartCommands::Remove { product_id } => {
            cart.remove_item(product_id);
            println!("Removed product {} from cart.", product_id);
        }
        CartCommands::Set {
            product_id,
            quantity,
        } => {
            cart.update_quantity(product_id, quantity)?;
            println!("Set product {} quantity to {}.", product_id, quantity);
        }
        CartCommands::Clear => {
            cart.clear();
            println!("Cart cleared.");
        }
    }
    Ok(())
}

// ============================================================================
// Session
// ============================================================================

async fn cmd_login(app: &App, email: &str, password: &str, admin: bool) -> Result<()> {
    let mut session = SessionStore::new(Arc::clone(&app.api), Arc::clone(&app.store));
    if admin {
        session.login_admin(email, password).await?;
    } else {
        session.login(email, password).await?;
    }

    // The profile fetch succeeded, so a user is always present here.
    if let Some(user) = session.user() {
        println!("Signed in as {} [{}]", user.email, user.roles.join(", "));
    }
    Ok(())
}

async fn cmd_register(app: &App, registration: Registration) -> Result<()> {
    let mut session = SessionStore::new(Arc::clone(&app.api), Arc::clone(&app.store));
    let email = registration.email.clone();
    session.register(&registration).await?;
    println!("Account created. Signed in as {}", email);
    Ok(())
}

async fn cmd_logout(app: &App) -> Result<()> {
    let mut session = app.session().await;
    session.logout();
    println!("Signed out.");
    Ok(())
}

async fn cmd_whoami(app: &App) -> Result<()> {
    let session = app.session().await;
    match session.user() {
        Some(user) => {
            println!("{}", user.email);
            if let Some(name) = &user.name {
                println!("  Name:  {}", name);
            }
            println!("  Roles: {}", user.roles.join(", "));
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

// ============================================================================
// Checkout
// ============================================================================

async fn cmd_checkout(app: &App) -> Result<()> {
    let session = app.session().await;
    let cart = app.cart();

    let mut flow = CheckoutFlow::new(Arc::clone(&app.api));
    let url = flow.submit(&cart, &session).await?;

    println!("Payment session created. Complete the payment at:");
    println!("\n  {}\n", url);
    println!("Then run: boutique verify <SESSION_ID>");
    Ok(())
}

async fn cmd_verify(app: &App, session_id: &str) -> Result<()> {
    let mut cart = app.cart();
    let mut flow = CheckoutFlow::new(Arc::clone(&app.api));

    match flow.verify(Some(session_id), &mut cart).await {
        CheckoutState::Confirmed { order } => {
            println!("Payment confirmed. Order #{} ({})", order.id, order.statut);
            println!("  Total: {:.2}", order.total);
            println!("Your cart has been cleared.");
        }
        CheckoutState::Pending { message } => {
            println!("Payment not settled yet: {}", message);
            println!("Your cart is unchanged; verify again later.");
        }
        CheckoutState::Failed { message } => {
            bail!("{}", message);
        }
        state => {
            bail!("Unexpected checkout state: {:?}", state);
        }
    }
    Ok(())
}

// ============================================================================
// Admin
// ============================================================================

async fn cmd_admin(app: &App, command: AdminCommands) -> Result<()> {
    // Role check first: no admin call leaves the client without it.
    let _session = app.admin_session().await?;

    match command {
        AdminCommands::AddProduct {
            nom,
            description,
            prix,
            stock,
            image_url,
            featured,
            category,
        } => {
            let payload = ProductPayload {
                nom,
                description,
                prix,
                quantite_stock: stock,
                image_url,
                featured,
                categorie: CategoryRef { id: category },
            };
            let product = app.api.create_product(&payload).await?;
            println!("Created product #{} ({})", product.id, product.nom);
        }
        AdminCommands::UpdateProduct {
            id,
            nom,
            description,
            prix,
            stock,
            image_url,
            featured,
            category,
        } => {
            let payload = ProductPayload {
                nom,
                description,
                prix,
                quantite_stock: stock,
                image_url,
                featured,
                categorie: CategoryRef { id: category },
            };
            let product = app.api.update_product(id, &payload).await?;
            println!("Updated product #{} ({})", product.id, product.nom);
        }
        AdminCommands::DeleteProduct { id } => {
            app.api.delete_product(id).await?;
            println!("Deleted product #{}", id);
        }
        AdminCommands::AddCategory { nom, description } => {
            let category = app
                .api
                .create_category(&CategoryPayload { nom, description })
                .await?;
            println!("Created category #{} ({})", category.id, category.nom);
        }
        AdminCommands::UpdateCategory {
            id,
            nom,
            description,
        } => {
            let category = app
                .api
                .update_category(id, &CategoryPayload { nom, description })
                .await?;
            println!("Updated category #{} ({})", category.id, category.nom);
        }
        AdminCommands::DeleteCategory { id } => {
            app.api.delete_category(id).await?;
            println!("Deleted category #{}", id);
        }
    }
    Ok(())
}
