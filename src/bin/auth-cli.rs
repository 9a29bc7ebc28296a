use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use auth_server::store::User;
use auth_server::{AuthClient, Request};

#[derive(Parser)]
#[command(name = "auth-cli")]
#[command(about = "Send a single sign-in or sign-up request to an auth server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an existing account
    SignIn {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Register a new account
    SignUp {
        #[arg(long)]
        login: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let request = match cli.command {
        Commands::SignIn { login, password } => Request::sign_in(&login, &password)?,
        Commands::SignUp {
            login,
            email,
            full_name,
            password,
        } => Request::sign_up(User::new_account(&login, &email, &full_name, &password))?,
    };

    let response = AuthClient::new(cli.addr).send(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
