//! Mints a bearer token the API will accept, for local development without
//! the identity provider.
//!
//! ```sh
//! JWT_SECRET=... cargo run -- --sub user-1 --hours 24
//! ```

use std::env;

use chrono::{Duration, Utc};
use dotenvy::dotenv;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

struct Args {
    sub: String,
    hours: i64,
    email: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut sub = None;
    let mut hours = 24;
    let mut email = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--sub" => sub = Some(value()?),
            "--hours" => {
                hours = value()?
                    .parse()
                    .map_err(|e| format!("invalid --hours: {e}"))?;
            }
            "--email" => email = Some(value()?),
            other => return Err(format!("unknown argument {other}")),
        }
    }

    Ok(Args {
        sub: sub.ok_or("--sub is required")?,
        hours,
        email,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let args = parse_args()?;
    let secret = env::var("JWT_SECRET")?;

    let now = Utc::now();
    let claims = Claims {
        sub: args.sub,
        exp: (now + Duration::hours(args.hours)).timestamp(),
        iat: now.timestamp(),
        email: args.email,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))?;
    println!("{}", token);

    Ok(())
}
