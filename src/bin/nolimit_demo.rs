//! Walkthrough of the SDK against the hosted noLimit service.
//!
//! Credentials come from the environment:
//!   NOLIMIT_PRIVATE_KEY (or PRIVATE_KEY)  pay per call from this wallet
//!   NOLIMIT_API_KEY                       prepaid access instead
//!
//! Without either it prints pricing and token info, then exits.

use dotenv::dotenv;
use nolimit_base_sdk::{
    CHAT_PRICE_USDC, ChatOptions, MIXER_BASE_FEE_USDC, MIXER_FEE_PERCENT, NoLimitClient,
    NoLimitConfig, SUPPORTED_TOKENS, SWAP_PRICE_USDC, SwapParams, calculate_fee, format_usd,
    truncate_address,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    println!("noLimit Base SDK");
    println!();
    print_pricing();
    print_tokens();
    print_fee_preview();

    let config = NoLimitConfig::from_env();
    if config.private_key.is_none() && config.api_key.is_none() {
        println!("Set NOLIMIT_PRIVATE_KEY (or PRIVATE_KEY) to pay per call,");
        println!("or NOLIMIT_API_KEY for prepaid access, then rerun for a");
        println!("live chat round trip and a swap quote.");
        return;
    }

    let client = match NoLimitClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build client: {}", e);
            std::process::exit(1);
        }
    };

    match client.address() {
        Some(address) => println!("Paying wallet: {}", truncate_address(address, 6)),
        None => println!("Using prepaid API key"),
    }
    println!();

    match client
        .chat()
        .send_with(
            "In one sentence, what is the Base network?",
            ChatOptions::default(),
        )
        .await
    {
        Ok(response) => {
            println!("Assistant: {}", response.message);
            if let Some(tx) = response.payment_tx {
                println!("Settled over x402: {}", tx);
            }
            if let Some(usage) = response.usage {
                println!("Tokens used: {}", usage.total_tokens);
            }
        }
        Err(e) => eprintln!("chat failed: {}", e),
    }
    println!();

    match client
        .swap()
        .quote(&SwapParams {
            from: "ETH".to_string(),
            to: "USDC".to_string(),
            amount: "0.1".to_string(),
            ..Default::default()
        })
        .await
    {
        Ok(quote) => {
            println!("Swap quote for 0.1 ETH:");
            println!("  out       {} USDC base units", quote.to_amount);
            println!("  min out   {}", quote.min_output);
            println!("  impact    {}%", quote.price_impact);
            println!("  route     {}", quote.route.join(" -> "));
        }
        Err(e) => eprintln!("swap quote failed: {}", e),
    }
}

fn print_pricing() {
    println!("Pricing:");
    println!("  chat   {} per message", format_usd(CHAT_PRICE_USDC));
    println!("  swap   {} per swap", format_usd(SWAP_PRICE_USDC));
    println!(
        "  mixer  ${} + {}% of the mixed amount",
        MIXER_BASE_FEE_USDC, MIXER_FEE_PERCENT
    );
    println!();
}

fn print_tokens() {
    println!("Supported tokens:");
    for token in &SUPPORTED_TOKENS {
        println!(
            "  {:<5} {}  ({} decimals)",
            token.symbol,
            truncate_address(token.address, 6),
            token.decimals
        );
    }
    println!();
}

fn print_fee_preview() {
    if let Ok((fee, output)) = calculate_fee("ETH", "1") {
        println!(
            "Mixing 1 ETH pays a {} ETH fee and delivers {} ETH",
            fee, output
        );
    }
    println!();
}
