use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Parser, Subcommand};

use facegate::{
    AttemptExecutor, Camera, Config, FrameSource, HttpRecognitionClient, Phase,
    RegistrationRequest, RegistrationSubmitter, ScanScheduler, SharedSession, StillSource,
};

#[derive(Parser)]
#[command(name = "facegate")]
#[command(about = "Face login against a remote recognition service")]
struct Cli {
    /// Enable development mode (verbose logging)
    #[arg(long, global = true)]
    dev: bool,

    /// Config file path (defaults to the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the camera until a registered face is recognized
    Login {
        /// Authenticate with a still image instead of the live camera
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Register a face image under a name
    Register {
        #[arg(short, long)]
        name: String,
        /// Path to the face image (JPEG, PNG, ...)
        image: PathBuf,
    },
    /// List registered users
    Users,
    /// Delete a user's enrollment
    Remove { name: String },
    /// Capture a single frame and save it
    TestCamera,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.dev);

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Login { image } => run_login(&config, image)?,
        Commands::Register { name, image } => {
            let api = HttpRecognitionClient::shared(&config.service);
            let submitter = RegistrationSubmitter::new(api, &config.registration);
            let message = submitter.submit(&RegistrationRequest {
                name,
                image_path: image,
            })?;
            println!("✅ {}", message);
        }
        Commands::Users => {
            let client = HttpRecognitionClient::new(&config.service);
            let users = client.list_users()?;
            if users.is_empty() {
                println!("No registered users.");
            }
            for user in users {
                println!("{:>4}  {}  (registered {})", user.id, user.name, user.created_at);
            }
        }
        Commands::Remove { name } => {
            let client = HttpRecognitionClient::new(&config.service);
            let message = client.delete_user(&name)?;
            println!("✅ {}", message);
        }
        Commands::TestCamera => {
            println!("Testing camera...");
            let mut camera = Camera::new(&config.camera)?;
            match camera.next_frame()? {
                Some(frame) => {
                    let payload = frame
                        .as_data_url()
                        .split_once(',')
                        .map(|(_, b64)| b64)
                        .unwrap_or_default();
                    let bytes = BASE64.decode(payload)?;
                    std::fs::write("test_capture.jpg", bytes)?;
                    println!("Saved test image to test_capture.jpg");
                }
                None => println!("No frame available from the camera."),
            }
        }
    }

    Ok(())
}

fn run_login(config: &Config, image: Option<PathBuf>) -> Result<()> {
    let api = HttpRecognitionClient::shared(&config.service);
    let frames: Box<dyn FrameSource> = match image {
        Some(path) => Box::new(StillSource::open(&path)?),
        None => Box::new(Camera::new(&config.camera)?),
    };

    let session = SharedSession::new();
    let executor = AttemptExecutor::new(frames, api);
    let mut scheduler = ScanScheduler::new(session.clone(), executor, config.scan.clone());
    scheduler.start();

    let deadline = Instant::now() + config.scan.session_timeout();
    let mut last_status: Option<String> = None;

    loop {
        let snapshot = session.snapshot();

        if snapshot.phase() == Phase::Authenticated {
            if let Some(user) = snapshot.user() {
                println!(
                    "✅ Welcome, {}! (confidence {:.1}%)",
                    user.name(),
                    user.confidence()
                );
            }
            break;
        }

        if let Some(status) = snapshot.status_text() {
            if last_status.as_deref() != Some(status) {
                println!("{}", status);
                last_status = Some(status.to_string());
            }
        }

        if Instant::now() >= deadline {
            println!(
                "✗ No match within {} seconds",
                config.scan.session_timeout_secs
            );
            break;
        }

        thread::sleep(Duration::from_millis(100));
    }

    scheduler.stop();
    Ok(())
}

fn setup_logging(dev_mode: bool) {
    if dev_mode {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}
