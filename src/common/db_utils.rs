use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

const DISPLAY_ID_WIDTH: usize = 5;

// ---
// IDs legíveis: "C00013", "AP00002", "INV00107"
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayIdKind {
    Lead,
    Appointment,
    Invoice,
}

impl DisplayIdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DisplayIdKind::Lead => "C",
            DisplayIdKind::Appointment => "AP",
            DisplayIdKind::Invoice => "INV",
        }
    }

    fn sequence(self) -> &'static str {
        match self {
            DisplayIdKind::Lead => "lead_id_seq",
            DisplayIdKind::Appointment => "appointment_id_seq",
            DisplayIdKind::Invoice => "invoice_id_seq",
        }
    }
}

pub fn format_display_id(kind: DisplayIdKind, seq: i64) -> String {
    format!("{}{:0width$}", kind.prefix(), seq, width = DISPLAY_ID_WIDTH)
}

/// Reserva o próximo número da sequence. `nextval` é atômico, então duas
/// requisições concorrentes nunca recebem o mesmo ID.
pub(crate) async fn next_display_id<'e, E>(
    executor: E,
    kind: DisplayIdKind,
) -> Result<(i64, String), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let seq: i64 = sqlx::query_scalar("SELECT nextval($1::regclass)")
        .bind(kind.sequence())
        .fetch_one(executor)
        .await?;

    Ok((seq, format_display_id(kind, seq)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_five_digits_with_prefix() {
        assert_eq!(format_display_id(DisplayIdKind::Lead, 13), "C00013");
        assert_eq!(format_display_id(DisplayIdKind::Appointment, 2), "AP00002");
        assert_eq!(format_display_id(DisplayIdKind::Invoice, 107), "INV00107");
    }

    #[test]
    fn wide_numbers_are_not_truncated() {
        assert_eq!(format_display_id(DisplayIdKind::Lead, 1_234_567), "C1234567");
    }
}
