// 🏷️ Description Labels - derived display text, never authoritative state
//
// The legacy store encoded linkage and status inside the description:
//   "Dívida: Carro (3/12) | 👤 Ana | Pendente"
//   "Notebook (2/10) | 👤 Geral | 💳 Nubank | Pendente"
//   "Meta: 💰 Casa Própria | 👤 Geral | Paga"
// and parsed it back out with substring search in several operations.
//
// Here the structured columns are authoritative; `render` produces the same
// label format for display, and `parse_legacy` reads the historical formats
// (including the older "Aporte Invest:" investment prefix) so imported
// databases can be backfilled once and never parsed again.

use crate::db::{EntryStatus, GroupKind, LedgerEntry, MovementType, PaymentMethod};

/// Render the display label for an entry from its structured fields.
pub fn render(entry: &LedgerEntry) -> String {
    let name = entry.group_name.as_deref().unwrap_or(&entry.description);

    let mut label = match entry.group_kind {
        Some(GroupKind::Divida) => format!("Dívida: {name}"),
        Some(GroupKind::Meta) => format!("Meta: {name}"),
        Some(GroupKind::Investimento) => format!("Investimento: {name}"),
        _ => name.to_string(),
    };

    if entry.installment_index == 0 {
        // Down payment of a debt plan
        label.push_str(" (Entrada)");
    } else if entry.installment_count > 1 {
        label.push_str(&format!(
            " ({}/{})",
            entry.installment_index, entry.installment_count
        ));
    }

    if let Some(resp) = &entry.responsible {
        label.push_str(&format!(" | 👤 {resp}"));
    }

    match (&entry.card, entry.payment_method) {
        (Some(card), _) => label.push_str(&format!(" | 💳 {card}")),
        (None, Some(method)) if method != PaymentMethod::Credito => {
            label.push_str(&format!(" | 💰 {}", method.as_str()));
        }
        _ => {}
    }

    label.push_str(&format!(" | {}", entry.status.as_str()));
    label
}

// ============================================================================
// LEGACY PARSING
// ============================================================================

/// Linkage recovered from a legacy description label.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLabel {
    pub group_kind: GroupKind,
    pub group_name: String,
    pub installment_index: i64,
    pub installment_count: i64,
    pub responsible: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub card: Option<String>,
    pub status: EntryStatus,
}

/// Split "Carro (3/12)" into ("Carro", 3, 12); "(Entrada)" marks a down
/// payment (index 0).
fn split_installment_suffix(head: &str) -> (&str, i64, i64) {
    if let Some(idx) = head.rfind(" (") {
        let tail = &head[idx + 2..];
        if let Some(inner) = tail.strip_suffix(')') {
            if inner == "Entrada" {
                return (&head[..idx], 0, 1);
            }
            if let Some((i, n)) = inner.split_once('/') {
                if let (Ok(i), Ok(n)) = (i.trim().parse(), n.trim().parse()) {
                    return (&head[..idx], i, n);
                }
            }
        }
    }
    (head, 1, 1)
}

/// Best-effort parse of a legacy label. Unrecognizable segments (e.g. the
/// old "À Vista"/"Parcelado" debt forms) are skipped; the status falls back
/// to "Pendente" whenever the text says so anywhere, matching the legacy
/// substring check.
pub fn parse_legacy(description: &str, movement: MovementType) -> ParsedLabel {
    let segments: Vec<&str> = description.split(" | ").map(str::trim).collect();
    let head = segments.first().copied().unwrap_or("");

    let (kind, raw_name) = if let Some(rest) = head.strip_prefix("Dívida:") {
        (GroupKind::Divida, rest)
    } else if let Some(rest) = head.strip_prefix("Meta:") {
        (GroupKind::Meta, rest)
    } else if let Some(rest) = head.strip_prefix("Investimento:") {
        (GroupKind::Investimento, rest)
    } else if let Some(rest) = head.strip_prefix("Aporte Invest:") {
        (GroupKind::Investimento, rest)
    } else if movement == MovementType::Receita {
        (GroupKind::Receita, head)
    } else {
        (GroupKind::Despesa, head)
    };

    let (name, index, count) = split_installment_suffix(raw_name.trim());

    let mut parsed = ParsedLabel {
        group_kind: kind,
        group_name: name.trim().to_string(),
        installment_index: index,
        installment_count: count,
        responsible: None,
        payment_method: None,
        card: None,
        status: if description.contains("Pendente") {
            EntryStatus::Pendente
        } else {
            EntryStatus::Paga
        },
    };

    for segment in segments.iter().skip(1) {
        if let Some(resp) = segment.strip_prefix("👤 ") {
            parsed.responsible = Some(resp.trim().to_string());
        } else if let Some(card) = segment.strip_prefix("💳 ") {
            parsed.card = Some(card.trim().to_string());
            parsed.payment_method = Some(PaymentMethod::Credito);
        } else if let Some(method) = segment.strip_prefix("💰 ") {
            parsed.payment_method = PaymentMethod::parse(method.trim());
        } else if let Some(status) = EntryStatus::parse(segment) {
            parsed.status = status;
        } else if let Some(method) = PaymentMethod::parse(segment) {
            parsed.payment_method = Some(method);
        }
    }

    parsed
}

// ============================================================================
// TESTS
// ============================================================================
