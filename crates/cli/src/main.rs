use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::render;
use foodlens_core::analysis::DetailRequest;
use foodlens_core::app::App;
use foodlens_core::config;
use providers::{ProfileForm, RegisterForm};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let app = App::open(cfg).await?;

    match cli.command {
        Commands::Register {
            email,
            password,
            name,
            height,
            weight,
            age,
            arm,
        } => {
            let form = RegisterForm {
                email,
                password,
                full_name: name,
                height_cm: height,
                weight_kg: weight,
                age_years: age,
                arm_circumference_cm: arm,
            };
            let profile = app.accounts().register(&form).await?;
            println!("registered {}", form.email);
            if let Some(p) = profile {
                println!("{}", serde_json::to_string_pretty(&p)?);
            }
            Ok(())
        }
        Commands::Login { email, password } => {
            app.accounts().login(&email, &password).await?;
            println!("logged in as {}", email);
            Ok(())
        }
        Commands::Logout => {
            app.accounts().logout().await?;
            println!("logged out");
            Ok(())
        }
        Commands::Profile {
            name,
            weight,
            age,
            arm,
            height,
        } => {
            let form = ProfileForm {
                full_name: name,
                weight_kg: weight,
                age_years: age,
                arm_circumference_cm: arm,
                height_cm: height,
            };
            let profile = app.accounts().update_profile(&form).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Commands::Analyze { image, json } => run_analyze(&app, image, json).await,
        Commands::Detail {
            label,
            image,
            confidence,
            nutrition,
            json,
        } => {
            let request = DetailRequest {
                label,
                confidence,
                image,
                nutrition,
                recommendation: None,
            };
            run_detail(&app, request, json).await
        }
        Commands::Progress { json } => run_progress(&app, json).await,
        Commands::History { json, fields } => run_history(&app, json, &fields).await,
        Commands::Tips { json } => run_tips(&app, json).await,
    }
}

#[derive(Parser)]
#[command(name = "foodlens")]
#[command(about = "Food photo nutrition analysis and daily calorie tracking", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Full name
        #[arg(long)]
        name: String,
        /// Height in cm
        #[arg(long)]
        height: f32,
        /// Weight in kg
        #[arg(long)]
        weight: f32,
        /// Age in years
        #[arg(long)]
        age: u32,
        /// Arm circumference in cm
        #[arg(long)]
        arm: f32,
    },
    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Update profile data
    Profile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        weight: f32,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        arm: f32,
        #[arg(long)]
        height: f32,
    },
    /// Upload a food photo, look up its calories and save the result
    Analyze {
        /// Image file to upload
        image: PathBuf,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a prediction that was produced elsewhere and record it
    Detail {
        /// Predicted class name
        #[arg(long)]
        label: Option<String>,
        /// Image path or URI
        #[arg(long)]
        image: Option<String>,
        /// Confidence as shown to the user, e.g. 87%
        #[arg(long)]
        confidence: Option<String>,
        /// Nutrition text to store with the record
        #[arg(long)]
        nutrition: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's calorie total against the daily goal
    Progress {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved analyses
    History {
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Restrict output fields (comma-separated), e.g. id,analyze_result,confidence_score
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
    },
    /// List nutrition tips
    Tips {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_analyze(app: &App, image: PathBuf, json: bool) -> Result<()> {
    let prediction = app.analyzer().await?.predict_image(&image).await?;
    let request = DetailRequest::from_prediction(&prediction, image.to_string_lossy());
    run_detail(app, request, json).await
}

async fn run_detail(app: &App, request: DetailRequest, json: bool) -> Result<()> {
    app.activate_progress().await?;
    let workflow = app.workflow().await?;
    let mut screen = workflow.open(request);

    if !json {
        for line in render::detail_lines(&screen.view) {
            println!("{}", line);
        }
    }
    for notice in &screen.view.notices {
        eprintln!("! {}", notice);
    }

    let nutrition = screen.settled_nutrition().await;
    // Let the history write land before the process exits.
    if let Some(saved) = screen.saved.take() {
        let _ = saved.await;
    }
    app.save_progress().await?;
    let display = app.progress().display();

    if json {
        let out = serde_json::json!({
            "view": screen.view,
            "nutrition": nutrition,
            "progress": {
                "label": display.label(),
                "current": display.current,
                "goal": display.goal,
            },
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if let Some(state) = &nutrition {
            println!("{}", render::nutrition_line(state));
        }
        println!("{}", render::progress_line(&display));
    }
    Ok(())
}

async fn run_progress(app: &App, json: bool) -> Result<()> {
    let reset = app.activate_progress().await?;
    let display = app.progress().display();
    if json {
        let out = serde_json::json!({
            "label": display.label(),
            "current": display.current,
            "goal": display.goal,
            "reset": reset,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", render::progress_line(&display));
    }
    Ok(())
}

async fn run_history(app: &App, json: bool, fields: &[String]) -> Result<()> {
    let rows = app.history().all().await?;
    if json || !fields.is_empty() {
        let vals: Vec<serde_json::Value> = rows
            .iter()
            .filter_map(|r| serde_json::to_value(r).ok())
            .collect();
        let filtered = render::filter_fields(vals, fields);
        println!("{}", serde_json::to_string_pretty(&filtered)?);
    } else {
        for row in &rows {
            println!("{}", render::history_line(row));
        }
        println!("{} saved analyses", rows.len());
    }
    Ok(())
}

async fn run_tips(app: &App, json: bool) -> Result<()> {
    let tips = app.tips().tips().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tips)?);
    } else {
        for tip in &tips {
            println!("{}", render::tip_line(tip));
        }
    }
    Ok(())
}
