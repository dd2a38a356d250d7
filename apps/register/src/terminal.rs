//! # Terminal
//!
//! The register's command loop state: session, selected store, catalog
//! cache, cart and checkout.
//!
//! ## Commands
//! ```text
//! login <email> <password>            register <email> <password> <name...>
//! logout                              stores / use <store-id>
//! catalog                             add <n | product-id>
//! cart                                remove <line>
//! qty <line> <+n | -n>                mod <line> <group>:<option>
//! disc <line> <discount name>         pay <cash | card> [tendered]
//! new                                 help / quit
//! ```
//!
//! ## Sale Flow
//! ```text
//! add / qty / mod / disc ──► pay ──► Checkout::submit ──► receipt printed
//!                             │                              │
//!                             └── failure: notice, cart kept └── new: cart cleared
//! ```
//!
//! An expired token (401) ends the session the same way `logout` does.

use std::fmt::Write as _;
use std::str::FromStr;

use tally_core::receipt::Receipt;
use tally_core::session::{Session, SessionStorage};
use tally_core::{
    CatalogSource, Category, Checkout, CheckoutPhase, CoreError, Credentials, DiscountKind,
    GatewayError, LoginRequest, Money, PaymentDetails, PaymentMethod, Product, RegisterRequest,
    SalesGateway, Store,
};
use tracing::{info, warn};

use crate::error::{RegisterError, RegisterResult};
use crate::gateway::AccountGateway;

pub const HELP: &str = "\
Commands:
  login <email> <password>           register <email> <password> <name>
  logout                             stores
  use <store-id>                     catalog
  add <n | product-id>               cart
  remove <line>                      qty <line> <+n | -n>
  mod <line> <group>:<option>        disc <line> <discount name>
  pay <cash | card> [tendered]       new
  help                               quit";

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Login { email: String, password: String },
    Register { email: String, password: String, name: String },
    Logout,
    Stores,
    Use(String),
    Catalog,
    /// Catalog number (1-based) or product ID.
    Add(String),
    /// Line indexes are 0-based; the prompt uses 1-based numbers.
    Remove(usize),
    Qty { line: usize, delta: i64 },
    Modifier { line: usize, group: String, option: String },
    Discount { line: usize, name: String },
    Cart,
    Pay { method: PaymentMethod, tendered: Option<Money> },
    New,
    Quit,
}

fn invalid(usage: &str) -> RegisterError {
    RegisterError::InvalidCommand(format!("Usage: {}", usage))
}

fn line_index(raw: Option<&str>, usage: &str) -> RegisterResult<usize> {
    match raw.and_then(|r| r.parse::<usize>().ok()) {
        Some(n) if n >= 1 => Ok(n - 1),
        _ => Err(invalid(usage)),
    }
}

impl FromStr for Command {
    type Err = RegisterError;

    fn from_str(input: &str) -> RegisterResult<Self> {
        let mut words = input.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(RegisterError::InvalidCommand("Type help for commands".into()));
        };
        let rest: Vec<&str> = words.collect();

        let command = match verb.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "login" => match rest.as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(invalid("login <email> <password>")),
            },
            "register" => match rest.as_slice() {
                [email, password, name @ ..] if !name.is_empty() => Command::Register {
                    email: email.to_string(),
                    password: password.to_string(),
                    name: name.join(" "),
                },
                _ => return Err(invalid("register <email> <password> <name>")),
            },
            "logout" => Command::Logout,
            "stores" => Command::Stores,
            "use" => match rest.as_slice() {
                [id] => Command::Use(id.to_string()),
                _ => return Err(invalid("use <store-id>")),
            },
            "catalog" | "products" => Command::Catalog,
            "add" => match rest.as_slice() {
                [product] => Command::Add(product.to_string()),
                _ => return Err(invalid("add <n | product-id>")),
            },
            "remove" | "rm" => Command::Remove(line_index(rest.first().copied(), "remove <line>")?),
            "qty" => {
                let usage = "qty <line> <+n | -n>";
                let line = line_index(rest.first().copied(), usage)?;
                let delta = rest
                    .get(1)
                    .and_then(|d| d.trim_start_matches('+').parse::<i64>().ok())
                    .filter(|_| rest.len() == 2)
                    .ok_or_else(|| invalid(usage))?;
                Command::Qty { line, delta }
            }
            "mod" => {
                let usage = "mod <line> <group>:<option>";
                let line = line_index(rest.first().copied(), usage)?;
                let selection = rest.get(1..).unwrap_or_default().join(" ");
                let (group, option) = selection.split_once(':').ok_or_else(|| invalid(usage))?;
                let (group, option) = (group.trim(), option.trim());
                if group.is_empty() || option.is_empty() {
                    return Err(invalid(usage));
                }
                Command::Modifier {
                    line,
                    group: group.to_string(),
                    option: option.to_string(),
                }
            }
            "disc" | "discount" => {
                let usage = "disc <line> <discount name>";
                let line = line_index(rest.first().copied(), usage)?;
                let name = rest.get(1..).unwrap_or_default().join(" ");
                if name.is_empty() {
                    return Err(invalid(usage));
                }
                Command::Discount { line, name }
            }
            "cart" => Command::Cart,
            "pay" => {
                let usage = "pay <cash | card> [tendered]";
                let method = rest
                    .first()
                    .ok_or_else(|| invalid(usage))?
                    .parse::<PaymentMethod>()
                    .map_err(|e| RegisterError::InvalidCommand(e.to_string()))?;
                let tendered = match rest.get(1) {
                    Some(raw) => Some(
                        raw.trim_start_matches('$')
                            .parse::<Money>()
                            .map_err(|_| invalid(usage))?,
                    ),
                    None => None,
                };
                Command::Pay { method, tendered }
            }
            "new" | "next" => Command::New,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(RegisterError::InvalidCommand(format!(
                    "Unknown command '{}'. Type help for commands",
                    other
                )))
            }
        };

        Ok(command)
    }
}

// =============================================================================
// Terminal
// =============================================================================

pub struct Terminal<G, S: SessionStorage> {
    gateway: G,
    session: Session<S>,
    preferred_store: Option<String>,
    store: Option<Store>,
    catalog: Vec<Product>,
    categories: Vec<Category>,
    cart: tally_core::Cart,
    checkout: Checkout,
}

impl<G, S> Terminal<G, S>
where
    G: SalesGateway + CatalogSource + AccountGateway,
    S: SessionStorage,
{
    /// Wraps a hydrated session; a restored token is handed to the gateway.
    pub fn new(mut gateway: G, session: Session<S>) -> Self {
        gateway.set_token(session.token().map(str::to_string));
        Terminal {
            gateway,
            session,
            preferred_store: None,
            store: None,
            catalog: Vec::new(),
            categories: Vec::new(),
            cart: tally_core::Cart::new(),
            checkout: Checkout::new(),
        }
    }

    /// Store to select automatically whenever a session starts.
    pub fn with_store(mut self, store_id: Option<String>) -> Self {
        self.preferred_store = store_id;
        self
    }

    pub fn cart(&self) -> &tally_core::Cart {
        &self.cart
    }

    pub fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Greeting shown at startup; selects the preferred store if logged in.
    pub async fn start(&mut self) -> RegisterResult<String> {
        let Some(user) = self.session.user() else {
            return Ok("Not logged in. Use: login <email> <password>".to_string());
        };
        let greeting = format!("Welcome back, {}", user.name);

        match self.preferred_store.clone() {
            Some(store_id) => {
                let result = self.select_store(&store_id).await;
                let selected = self.guard(result)?;
                Ok(format!("{}\n{}", greeting, selected))
            }
            None => Ok(greeting),
        }
    }

    /// Runs one command and returns the text to show.
    pub async fn execute(&mut self, command: Command) -> RegisterResult<String> {
        let result = match command {
            Command::Help => Ok(HELP.to_string()),
            Command::Login { email, password } => {
                let request = LoginRequest { email, password };
                match self.gateway.login(&request).await {
                    Ok(credentials) => self.begin_session(credentials).await,
                    Err(e) => Err(e.into()),
                }
            }
            Command::Register {
                email,
                password,
                name,
            } => {
                let request = RegisterRequest {
                    name,
                    email,
                    password,
                };
                match self.gateway.register(&request).await {
                    Ok(credentials) => self.begin_session(credentials).await,
                    Err(e) => Err(e.into()),
                }
            }
            Command::Logout => {
                self.end_session();
                Ok("Logged out".to_string())
            }
            Command::Stores => self.list_stores().await,
            Command::Use(store_id) => self.select_store(&store_id).await,
            Command::Catalog => self.reload_catalog().await,
            Command::Add(product) => self.add(&product),
            Command::Remove(line) => self.remove(line),
            Command::Qty { line, delta } => self.change_quantity(line, delta),
            Command::Modifier {
                line,
                group,
                option,
            } => self.toggle_modifier(line, &group, &option),
            Command::Discount { line, name } => self.toggle_discount(line, &name),
            Command::Cart => Ok(self.render_cart()),
            Command::Pay { method, tendered } => self.pay(method, tendered).await,
            Command::New => self
                .checkout
                .close_receipt(&mut self.cart)
                .map(|_| "Ready for the next sale".to_string())
                .map_err(RegisterError::from),
            Command::Quit => Ok("Bye".to_string()),
        };

        self.guard(result)
    }

    /// Ends the session when the server reports the token as invalid.
    fn guard(&mut self, result: RegisterResult<String>) -> RegisterResult<String> {
        let expired = matches!(
            &result,
            Err(RegisterError::Gateway(GatewayError::Unauthorized))
                | Err(RegisterError::PaymentFailed {
                    source: GatewayError::Unauthorized,
                    ..
                })
        );
        if expired {
            warn!("Server rejected the session token, logging out");
            self.end_session();
        }
        result
    }

    async fn begin_session(&mut self, credentials: Credentials) -> RegisterResult<String> {
        self.gateway.set_token(Some(credentials.token.clone()));
        let name = credentials.user.name.clone();
        if let Err(e) = self.session.login(credentials) {
            warn!(error = %e, "Login will not survive a restart");
        }
        info!(user = %name, "Logged in");

        let mut out = format!("Logged in as {}", name);
        if let Some(store_id) = self.preferred_store.clone() {
            let selected = self.select_store(&store_id).await?;
            out.push('\n');
            out.push_str(&selected);
        }
        Ok(out)
    }

    /// Drops the session and every cached server mirror.
    fn end_session(&mut self) {
        if let Err(e) = self.session.logout() {
            warn!(error = %e, "Could not clear the stored session");
        }
        self.gateway.set_token(None);
        self.store = None;
        self.catalog.clear();
        self.categories.clear();
        self.cart.clear();
        self.checkout.reset();
    }

    fn require_login(&self) -> RegisterResult<()> {
        if self.session.is_logged_in() {
            Ok(())
        } else {
            Err(RegisterError::NotLoggedIn)
        }
    }

    fn require_editable_cart(&self) -> RegisterResult<()> {
        if self.checkout.phase() == CheckoutPhase::ReceiptShown {
            return Err(RegisterError::InvalidCommand(
                "Start the next sale first (new)".to_string(),
            ));
        }
        Ok(())
    }

    async fn list_stores(&mut self) -> RegisterResult<String> {
        self.require_login()?;
        let stores = self.gateway.list_stores().await?;
        if stores.is_empty() {
            return Ok("No stores yet".to_string());
        }

        let mut out = String::new();
        for store in &stores {
            let marker = match &self.store {
                Some(current) if current.id == store.id => "*",
                _ => " ",
            };
            let _ = writeln!(out, "{} {}  {}  {}", marker, store.id, store.name, store.address);
        }
        Ok(out.trim_end().to_string())
    }

    async fn select_store(&mut self, store_id: &str) -> RegisterResult<String> {
        self.require_login()?;
        let store = self
            .gateway
            .list_stores()
            .await?
            .into_iter()
            .find(|s| s.id == store_id)
            .ok_or_else(|| RegisterError::InvalidCommand(format!("No store {}", store_id)))?;

        self.store = Some(store);
        self.cart.clear();
        self.checkout.reset();
        self.reload_catalog().await
    }

    async fn reload_catalog(&mut self) -> RegisterResult<String> {
        self.require_login()?;
        let store = self.store.as_ref().ok_or(RegisterError::NoStoreSelected)?;

        self.catalog = self.gateway.list_products(&store.id).await?;
        self.categories = self.gateway.list_categories(&store.id).await?;
        info!(store = %store.id, products = self.catalog.len(), "Catalog loaded");

        Ok(format!("{}\n{}", store.name, self.render_catalog()))
    }

    fn render_catalog(&self) -> String {
        if self.catalog.is_empty() {
            return "No products".to_string();
        }

        let mut out = String::new();
        for (i, product) in self.catalog.iter().enumerate() {
            let category = product
                .category
                .as_deref()
                .and_then(|id| self.categories.iter().find(|c| c.id == id))
                .map(|c| format!(" [{}]", c.name))
                .unwrap_or_default();
            let _ = writeln!(out, "{:>3}. {}{}  {}", i + 1, product.name, category, product.price);

            for group in &product.modifiers {
                let options: Vec<String> = group
                    .options
                    .iter()
                    .map(|o| format!("{} +{}", o.name, o.price))
                    .collect();
                let _ = writeln!(out, "       {}: {}", group.name, options.join(", "));
            }
            for discount in &product.discounts {
                let amount = match discount.kind {
                    DiscountKind::Percentage => format!("{}%", discount.value.normalize()),
                    DiscountKind::Fixed => format!("-{} each", Money::new(discount.value)),
                };
                let _ = writeln!(out, "       discount {} ({})", discount.name, amount);
            }
        }
        out.trim_end().to_string()
    }

    fn find_product(&self, reference: &str) -> RegisterResult<Product> {
        let by_number = reference
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.catalog.get(i));

        by_number
            .or_else(|| self.catalog.iter().find(|p| p.id == reference))
            .cloned()
            .ok_or_else(|| {
                RegisterError::InvalidCommand(format!("No product {} in the catalog", reference))
            })
    }

    fn line_product(&self, line: usize) -> RegisterResult<&Product> {
        self.cart.line(line).map(|l| l.product()).ok_or(
            CoreError::LineNotFound {
                index: line,
                len: self.cart.len(),
            }
            .into(),
        )
    }

    fn add(&mut self, reference: &str) -> RegisterResult<String> {
        self.require_editable_cart()?;
        let product = self.find_product(reference)?;
        let quantity = self.cart.add_item(&product)?;
        Ok(format!("{} x{}  (total {})", product.name, quantity, self.cart.total()))
    }

    fn remove(&mut self, line: usize) -> RegisterResult<String> {
        self.require_editable_cart()?;
        let product_id = self.line_product(line)?.id.clone();
        self.cart.remove_item(&product_id);
        Ok(format!("Removed line {}  (total {})", line + 1, self.cart.total()))
    }

    fn change_quantity(&mut self, line: usize, delta: i64) -> RegisterResult<String> {
        self.require_editable_cart()?;
        let product = self.line_product(line)?;
        let (id, name) = (product.id.clone(), product.name.clone());
        let quantity = self.cart.change_quantity(&id, delta)?;
        Ok(format!("{} x{}  (total {})", name, quantity, self.cart.total()))
    }

    fn toggle_modifier(&mut self, line: usize, group: &str, option: &str) -> RegisterResult<String> {
        self.require_editable_cart()?;
        let product = self.line_product(line)?;

        let group = product
            .modifiers
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(group))
            .ok_or_else(|| {
                RegisterError::InvalidCommand(format!("{} has no modifier {}", product.name, group))
            })?;
        let option = group
            .options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(option))
            .cloned()
            .ok_or_else(|| {
                RegisterError::InvalidCommand(format!("{} has no option {}", group.name, option))
            })?;
        let group_name = group.name.clone();

        let message = format!("{}: {}", group_name, option.name);
        self.cart.toggle_modifier(line, &group_name, option)?;
        Ok(format!("{}  (total {})", message, self.cart.total()))
    }

    fn toggle_discount(&mut self, line: usize, name: &str) -> RegisterResult<String> {
        self.require_editable_cart()?;
        let product = self.line_product(line)?;
        let discount = product
            .discounts
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                RegisterError::InvalidCommand(format!("{} has no discount {}", product.name, name))
            })?;

        let label = discount.name.clone();
        let applied = self.cart.toggle_discount(line, discount)?;
        let verb = if applied { "Applied" } else { "Removed" };
        Ok(format!("{} {}  (total {})", verb, label, self.cart.total()))
    }

    pub fn render_cart(&self) -> String {
        if self.cart.is_empty() {
            return "Cart is empty".to_string();
        }

        let mut out = String::new();
        for (i, line) in self.cart.items().iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} x{}  {}",
                i + 1,
                line.product().name,
                line.quantity(),
                line.total()
            );
            for modifier in line.selected_modifiers() {
                let _ = writeln!(out, "   + {}: {}", modifier.name, modifier.option.name);
            }
            for discount in line.selected_discounts() {
                let _ = writeln!(out, "   - {}", discount.name);
            }
        }
        let _ = write!(
            out,
            "Items {}  Total {}",
            self.cart.total_quantity(),
            self.cart.total()
        );
        out
    }

    async fn pay(
        &mut self,
        method: PaymentMethod,
        tendered: Option<Money>,
    ) -> RegisterResult<String> {
        self.require_login()?;
        let store = self.store.as_ref().ok_or(RegisterError::NoStoreSelected)?;

        let tendered = match method {
            PaymentMethod::Cash => tendered,
            PaymentMethod::Card => None,
        };
        if let Some(amount) = tendered {
            if amount < self.cart.total() {
                return Err(RegisterError::InvalidCommand(format!(
                    "Tendered {} is less than the total {}",
                    amount,
                    self.cart.total()
                )));
            }
        }

        self.checkout.begin_payment(&self.cart)?;
        let details = PaymentDetails {
            tendered,
            reference: None,
        };

        let receipt = match self
            .checkout
            .submit(&self.gateway, &store.id, &self.cart, method, details)
            .await
        {
            Ok(confirmed) => Receipt::new(store, &self.cart, confirmed).render(),
            Err(CoreError::Submission(source)) => {
                let notice = self
                    .checkout
                    .take_notice()
                    .map(|n| n.message)
                    .unwrap_or_else(|| tally_core::PAYMENT_FAILED_NOTICE.to_string());
                return Err(RegisterError::PaymentFailed { notice, source });
            }
            Err(e) => return Err(e.into()),
        };

        let notice = self
            .checkout
            .take_notice()
            .map(|n| n.message)
            .unwrap_or_default();
        Ok(format!("{}\n{}\nType new for the next sale", receipt, notice))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use tally_core::session::MemorySessionStorage;
    use tally_core::{
        Discount, ModifierGroup, ModifierOption, Sale, SaleRequest, SaleStatus, User,
    };

    #[derive(Default)]
    struct FakeBackend {
        products: Vec<Product>,
        fail_with: Option<GatewayError>,
        submitted: Mutex<Vec<SaleRequest>>,
        token: Option<String>,
    }

    fn store() -> Store {
        Store {
            id: "s-1".to_string(),
            name: "Corner Cafe".to_string(),
            address: "12 Main Street".to_string(),
            phone: "555-0100".to_string(),
            owner: "u-1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            token: "t0ken".to_string(),
            user: User {
                id: "u-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        }
    }

    impl SalesGateway for FakeBackend {
        async fn create_sale(&self, request: &SaleRequest) -> Result<Sale, GatewayError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.submitted.lock().unwrap().push(request.clone());
            Ok(Sale {
                id: "sale-1".to_string(),
                store: request.store.clone(),
                items: Vec::new(),
                total: request.total,
                payment_method: request.payment_method,
                status: SaleStatus::Completed,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }
    }

    impl CatalogSource for FakeBackend {
        async fn list_products(&self, _store_id: &str) -> Result<Vec<Product>, GatewayError> {
            Ok(self.products.clone())
        }

        async fn list_categories(&self, _store_id: &str) -> Result<Vec<Category>, GatewayError> {
            Ok(Vec::new())
        }
    }

    impl AccountGateway for FakeBackend {
        async fn login(&self, request: &LoginRequest) -> Result<Credentials, GatewayError> {
            if request.password == "secret1" {
                Ok(credentials())
            } else {
                Err(GatewayError::Rejected {
                    message: "Invalid email or password".to_string(),
                })
            }
        }

        async fn register(&self, _request: &RegisterRequest) -> Result<Credentials, GatewayError> {
            Ok(credentials())
        }

        async fn list_stores(&self) -> Result<Vec<Store>, GatewayError> {
            Ok(vec![store()])
        }

        fn set_token(&mut self, token: Option<String>) {
            self.token = token;
        }
    }

    fn pizza() -> Product {
        Product::new("p-1", "s-1", "Pizza", Money::from_cents(1000))
            .with_modifier_group(ModifierGroup {
                name: "Size".to_string(),
                options: vec![
                    ModifierOption::new("Small", Money::zero()),
                    ModifierOption::new("Large", Money::from_cents(150)),
                ],
            })
            .with_discount(Discount::percentage("Happy Hour", 10))
    }

    async fn ready_terminal(backend: FakeBackend) -> Terminal<FakeBackend, MemorySessionStorage> {
        let mut terminal = Terminal::new(
            FakeBackend {
                products: vec![pizza()],
                ..backend
            },
            Session::hydrate(MemorySessionStorage::new()),
        )
        .with_store(Some("s-1".to_string()));
        terminal
            .execute("login ada@example.com secret1".parse().unwrap())
            .await
            .unwrap();
        terminal
    }

    async fn run(
        terminal: &mut Terminal<FakeBackend, MemorySessionStorage>,
        line: &str,
    ) -> RegisterResult<String> {
        terminal.execute(line.parse()?).await
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "qty 2 +3".parse::<Command>().unwrap(),
            Command::Qty { line: 1, delta: 3 }
        );
        assert_eq!(
            "mod 1 Milk Type: Oat Milk".parse::<Command>().unwrap(),
            Command::Modifier {
                line: 0,
                group: "Milk Type".to_string(),
                option: "Oat Milk".to_string()
            }
        );
        assert_eq!(
            "PAY cash $50".parse::<Command>().unwrap(),
            Command::Pay {
                method: PaymentMethod::Cash,
                tendered: Some(Money::from_cents(5000))
            }
        );
        assert!("pay bitcoin".parse::<Command>().is_err());
        assert!("remove 0".parse::<Command>().is_err());
        assert!("frobnicate".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_login_selects_preferred_store_and_loads_catalog() {
        let terminal = ready_terminal(FakeBackend::default()).await;
        assert!(terminal.session().is_logged_in());
        assert_eq!(terminal.gateway().token.as_deref(), Some("t0ken"));
        assert_eq!(terminal.store().map(|s| s.id.as_str()), Some("s-1"));
        assert_eq!(terminal.catalog().len(), 1);
    }

    #[tokio::test]
    async fn test_sale_flow_prices_and_clears_after_receipt() {
        let mut terminal = ready_terminal(FakeBackend::default()).await;

        run(&mut terminal, "add 1").await.unwrap();
        run(&mut terminal, "add p-1").await.unwrap();
        run(&mut terminal, "mod 1 size:large").await.unwrap();
        run(&mut terminal, "disc 1 happy hour").await.unwrap();
        assert_eq!(terminal.cart().total(), Money::from_cents(2070));

        let out = run(&mut terminal, "pay cash 25").await.unwrap();
        assert!(out.contains("Corner Cafe"));
        assert!(out.contains("$20.70"));
        assert!(out.contains("$4.30"));
        assert!(out.contains(tally_core::PAYMENT_SUCCEEDED_NOTICE));

        let submitted = terminal.gateway().submitted.lock().unwrap().clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].total, Money::from_cents(2070));
        assert_eq!(submitted[0].items[0].quantity, 2);

        assert!(run(&mut terminal, "add 1").await.is_err());
        run(&mut terminal, "new").await.unwrap();
        assert!(terminal.cart().is_empty());
        assert_eq!(terminal.checkout().phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_cart() {
        let mut terminal = ready_terminal(FakeBackend {
            fail_with: Some(GatewayError::Transport("connection refused".to_string())),
            ..Default::default()
        })
        .await;
        run(&mut terminal, "add 1").await.unwrap();
        let before = terminal.cart().clone();

        let err = run(&mut terminal, "pay card").await.unwrap_err();
        assert!(err.to_string().starts_with(tally_core::PAYMENT_FAILED_NOTICE));
        assert_eq!(terminal.cart(), &before);
        assert_eq!(terminal.checkout().phase(), CheckoutPhase::Idle);
        assert!(terminal.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_expired_token_logs_out_and_drops_state() {
        let mut terminal = ready_terminal(FakeBackend {
            fail_with: Some(GatewayError::Unauthorized),
            ..Default::default()
        })
        .await;
        run(&mut terminal, "add 1").await.unwrap();

        assert!(run(&mut terminal, "pay card").await.is_err());
        assert!(!terminal.session().is_logged_in());
        assert!(terminal.cart().is_empty());
        assert!(terminal.catalog().is_empty());
        assert!(terminal.gateway().token.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_discount_leaves_cart_unchanged() {
        let absurd = Product::new("p-2", "s-1", "Gift", Money::from_cents(1000))
            .with_discount(Discount::fixed("Absurd", Money::max_amount() + Money::max_amount()));
        let mut terminal = Terminal::new(
            FakeBackend {
                products: vec![absurd],
                ..Default::default()
            },
            Session::hydrate(MemorySessionStorage::new()),
        )
        .with_store(Some("s-1".to_string()));
        run(&mut terminal, "login ada@example.com secret1").await.unwrap();

        run(&mut terminal, "add 1").await.unwrap();
        let before = terminal.cart().clone();

        assert!(matches!(
            run(&mut terminal, "disc 1 absurd").await,
            Err(RegisterError::Core(CoreError::AmountOverflow))
        ));
        assert_eq!(terminal.cart(), &before);
        assert_eq!(terminal.cart().total(), Money::from_cents(1000));
    }

    #[tokio::test]
    async fn test_cart_guards() {
        let mut terminal = ready_terminal(FakeBackend::default()).await;

        assert!(matches!(
            run(&mut terminal, "pay card").await,
            Err(RegisterError::Core(CoreError::EmptyCart))
        ));
        run(&mut terminal, "add 1").await.unwrap();
        assert!(run(&mut terminal, "pay cash 5").await.is_err());
        assert!(run(&mut terminal, "mod 1 Size:Huge").await.is_err());
        assert!(run(&mut terminal, "qty 3 +1").await.is_err());

        run(&mut terminal, "qty 1 -5").await.unwrap();
        assert_eq!(terminal.cart().line(0).unwrap().quantity(), 1);

        run(&mut terminal, "remove 1").await.unwrap();
        assert!(terminal.cart().is_empty());
    }

    #[tokio::test]
    async fn test_requires_login() {
        let mut terminal = Terminal::new(
            FakeBackend::default(),
            Session::hydrate(MemorySessionStorage::new()),
        );
        assert!(matches!(
            terminal.execute(Command::Stores).await,
            Err(RegisterError::NotLoggedIn)
        ));
        assert!(terminal
            .execute("login ada@example.com wrong".parse().unwrap())
            .await
            .is_err());
        assert!(!terminal.session().is_logged_in());
    }
}
