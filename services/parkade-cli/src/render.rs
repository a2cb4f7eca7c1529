use parkade_core::lot::{AvailabilityEntry, Money, Ticket};

pub(crate) fn render_availability(title: &str, entries: &[AvailabilityEntry]) {
    println!("\n{title}");
    if entries.is_empty() {
        println!("- no spots configured");
        return;
    }

    let mut current_floor = None;
    for entry in entries {
        if current_floor != Some(entry.floor) {
            println!("Floor {}", entry.floor);
            current_floor = Some(entry.floor);
        }
        println!(
            "- {:<6} {}/{} free",
            entry.capacity.label(),
            entry.available,
            entry.total
        );
    }

    let available: usize = entries.iter().map(|entry| entry.available).sum();
    let total: usize = entries.iter().map(|entry| entry.total).sum();
    println!("Total: {available}/{total} free");
}

pub(crate) fn render_receipts(tickets: &[Ticket]) {
    println!("\nReceipts");
    let mut revenue = 0u64;
    for ticket in tickets {
        let fee = ticket.fee().unwrap_or_default();
        revenue += fee.cents();
        let exited = ticket
            .exited_at()
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        println!(
            "- {} {:<10} {:<10} spot {} (floor {}) {} -> {}  ${}",
            ticket.id,
            ticket.plate,
            ticket.vehicle_size.kind(),
            ticket.spot_id,
            ticket.floor,
            ticket.entered_at.format("%H:%M"),
            exited,
            fee
        );
    }
    println!("Revenue: ${}", Money::from_cents(revenue));
}
