use zapgate_core::{GateConfig, ImageQrEncoder, ZbdClient};
use zapgate_play::{Coordinator, Presenter, SessionKind, SlotImage};

// Console presenter: writes the QR to a file so a wallet can scan it.
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn set_panel_visible(&self, visible: bool) {
        println!("[panel] visible: {}", visible);
    }

    fn set_caption(&self, caption: &str) {
        println!("[panel] {}", caption);
    }

    fn set_image(&self, image: SlotImage) {
        match image {
            SlotImage::Qr(raster) => {
                raster.save("invoice-qr.png").expect("failed to write QR image");
                println!("[panel] scan invoice-qr.png with a Lightning wallet");
            }
            SlotImage::Paid => println!("[panel] PAID"),
            SlotImage::Withdrawn => println!("[panel] WITHDRAWN"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut config = GateConfig::default();
    config.api_key = std::env::var("ZAPGATE_API_KEY")?;
    if let Ok(url) = std::env::var("ZAPGATE_BASE_URL") {
        config.base_url = url;
    }

    let client = ZbdClient::from_config(&config)?;
    let coordinator = Coordinator::new(config, client, ImageQrEncoder, ConsolePresenter)?;

    coordinator.set_on_settled(|kind: SessionKind| {
        println!("Session settled: {:?}", kind);
    });
    coordinator.set_on_failed(|kind: SessionKind| {
        println!("Session failed: {:?}", kind);
    });

    println!(
        "Charging {} sats for a game play...",
        coordinator.config().fee_sats
    );
    coordinator.pay_for_play().await?;
    println!("Balance: {} sats", coordinator.balance());

    println!("Withdrawing winnings...");
    coordinator.withdraw_all().await?;
    println!("Balance: {} sats", coordinator.balance());

    println!("Example completed successfully!");
    Ok(())
}
