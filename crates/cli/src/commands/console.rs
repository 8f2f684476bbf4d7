//! Console commands against the configured backend.
//!
//! Output is plain text, one entity per line.

#![allow(clippy::print_stdout)]

use rust_decimal::Decimal;
use tracing::info;

use support_desk::{AppContext, AppError};
use support_desk_core::{
    ChatId, DashboardStats, OrderId, OrderStatus, PaymentStatus, Price, Product, ProductId,
};

// =============================================================================
// Chats
// =============================================================================

pub async fn chats(ctx: &AppContext) -> Result<(), AppError> {
    for chat in ctx.chats().list_chats().await? {
        println!(
            "{}  {:<20} unread={:<3} ai={}  {}",
            chat.id,
            chat.name,
            chat.unread_count,
            if chat.ai_enabled { "on " } else { "off" },
            chat.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub async fn messages(ctx: &AppContext, chat: ChatId) -> Result<(), AppError> {
    for message in ctx.chats().messages(chat).await? {
        println!(
            "[{}] {:<4} {}",
            message.created_at.format("%H:%M:%S"),
            message.sender.to_string(),
            message.content
        );
    }
    Ok(())
}

pub async fn send(
    ctx: &AppContext,
    chat: ChatId,
    text: &str,
    product: Option<ProductId>,
    wait: bool,
) -> Result<(), AppError> {
    let sent = ctx.chats().send_message(chat, text, product).await?;
    println!("Sent {}", sent.message.id);

    if wait && sent.reply.is_some() {
        info!("Waiting for assistant reply");
        if let Some(reply) = sent.wait_reply().await {
            println!("{}: {}", reply.sender, reply.content);
        }
    }
    Ok(())
}

pub async fn set_ai(ctx: &AppContext, chat: ChatId, enabled: bool) -> Result<(), AppError> {
    let chat = ctx.chats().set_ai_enabled(chat, enabled).await?;
    println!(
        "AI assistant {} for {}",
        if chat.ai_enabled { "enabled" } else { "disabled" },
        chat.name
    );
    Ok(())
}

pub async fn mark_read(ctx: &AppContext, chat: ChatId) -> Result<(), AppError> {
    let chat = ctx.chats().mark_read(chat).await?;
    println!("Marked {} as read", chat.name);
    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

pub async fn products(ctx: &AppContext) -> Result<(), AppError> {
    for product in ctx.catalog().list().await? {
        println!(
            "{}  {:<24} {:>9} qty={:<4} {}{}",
            product.id,
            product.name,
            format!("${}", product.price),
            product.quantity,
            product.category,
            if product.available { "" } else { " (unavailable)" }
        );
    }
    Ok(())
}

pub async fn add_product(
    ctx: &AppContext,
    name: &str,
    price: Decimal,
    category: &str,
    quantity: u32,
) -> Result<(), AppError> {
    let price = Price::new(price).map_err(|e| AppError::Validation(e.to_string()))?;
    let product = Product::new(name, price, category).with_quantity(quantity);
    let product = ctx.catalog().create(product).await?;
    println!("Created {} ({})", product.id, product.name);
    Ok(())
}

pub async fn delete_product(ctx: &AppContext, id: ProductId) -> Result<(), AppError> {
    if ctx.catalog().delete(id).await? {
        println!("Deleted {id}");
    } else {
        println!("No product {id}");
    }
    Ok(())
}

// =============================================================================
// Orders
// =============================================================================

pub async fn orders(ctx: &AppContext) -> Result<(), AppError> {
    for order in ctx.orders().list().await? {
        println!(
            "{}  {:<20} {:<10} {:<9} {:>9}  {}",
            order.id,
            order.customer_name,
            order.status.to_string(),
            order.payment_status.to_string(),
            format!("${}", order.total_amount),
            order.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub async fn order_status(
    ctx: &AppContext,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), AppError> {
    let order = ctx.orders().update_status(id, status).await?;
    println!("Order {} is now {}", order.id, order.status);
    Ok(())
}

pub async fn order_payment(
    ctx: &AppContext,
    id: OrderId,
    status: PaymentStatus,
) -> Result<(), AppError> {
    let order = ctx.orders().update_payment_status(id, status).await?;
    println!("Order {} payment is now {}", order.id, order.payment_status);
    Ok(())
}

// =============================================================================
// Analytics
// =============================================================================

pub async fn stats(ctx: &AppContext) -> Result<(), AppError> {
    print_stats(&ctx.analytics().dashboard().await?);
    Ok(())
}

fn print_stats(stats: &DashboardStats) {
    println!("Chats:            {}", stats.chat_count);
    println!("  unread:         {}", stats.unread_messages);
    println!("  AI enabled:     {}", stats.ai_enabled_chats);
    println!("Products:         {}", stats.product_count);
    println!("  low stock:      {}", stats.low_stock_products);
    println!(
        "Orders:           new={} processing={} completed={} cancelled={}",
        stats.orders.new, stats.orders.processing, stats.orders.completed, stats.orders.cancelled
    );
    println!("Paid revenue:     ${}", stats.paid_revenue);
}
