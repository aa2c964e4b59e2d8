use anyhow::Context;
use clap::Parser;
use listing_desk::gateway::{HttpGateway, ListingGateway, Session};
use listing_desk::models::{format_inr, matches_search, ListingId, PersistedListing, PropertyKind};
use listing_desk::GatewayConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-desk")]
#[command(about = "Browse listings stored on the listing gateway")]
struct Args {
    /// Show only this listing
    id: Option<String>,

    /// Keep listings whose name, address or type contains this text
    #[arg(short, long)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Listing Desk");
    info!("==============");

    let config = GatewayConfig::from_env().context("Failed to load gateway configuration")?;
    let session = config.token.clone().map(Session::from_token);
    if let Some(user) = session.as_ref().and_then(Session::user) {
        info!("Signed in as {}", user.name.as_deref().unwrap_or(&user.id));
    }

    let gateway = HttpGateway::new(&config, session)?;
    info!("Using listing gateway at {}", config.base_url);
    if gateway.session().is_some() {
        match gateway.profile().await {
            Ok(profile) => info!("👤 {} <{}>", profile.name, profile.email),
            Err(e) => warn!("Could not load profile: {}", e),
        }
    }

    // A listing id argument shows that listing only
    if let Some(id) = args.id {
        let id = ListingId::new(id);
        match gateway.get_listing(&id).await? {
            Some(listing) => print_listing(1, &listing),
            None => warn!("Listing {} not found", id),
        }
        return Ok(());
    }

    let listings = gateway
        .list_listings()
        .await
        .context("Failed to fetch listings")?;

    let total = listings.len();
    let listings: Vec<PersistedListing> = match args.search.as_deref() {
        Some(term) => listings
            .into_iter()
            .filter(|listing| matches_search(listing, term))
            .collect(),
        None => listings,
    };

    info!("\n✅ Showing {} of {} listings\n", listings.len(), total);
    for (i, listing) in listings.iter().enumerate() {
        print_listing(i + 1, listing);
    }

    let json = serde_json::to_string_pretty(&listings)?;
    tokio::fs::write("listings.json", json).await?;
    info!("💾 Saved {} listings to listings.json", listings.len());

    Ok(())
}

fn print_listing(position: usize, listing: &PersistedListing) {
    let kind = match listing.kind {
        PropertyKind::Sale => "for sale",
        PropertyKind::Rent => "for rent",
        PropertyKind::Unset => "unlisted",
    };
    println!("{}. {} (₹{}, {})", position, listing.name, format_inr(listing.asking_price()), kind);
    if listing.offer && listing.discount_price > 0 {
        println!("   Was ₹{}", format_inr(listing.regular_price));
    }
    println!(
        "   {} bed, {} bath, {} sq ft",
        listing.bedrooms, listing.bathrooms, listing.square_footage
    );
    println!("   {}", listing.address);
    let mut features = Vec::new();
    if listing.parking {
        features.push("Parking");
    }
    if listing.furnished {
        features.push("Furnished");
    }
    if !features.is_empty() {
        println!("   Features: {}", features.join(", "));
    }
    println!("   Images: {}", listing.images.len());
    println!("   ID: {}", listing.id);
    println!();
}
