use crate::models::StepLosses;

/// Format a message reporting the total number of matrix operations.
pub fn format_total_ops(count: usize) -> String {
    format!("Total matrix ops: {}", count)
}

/// Log the total number of matrix operations at info level.
pub fn log_total_ops(count: usize) {
    log::info!("{}", format_total_ops(count));
}

/// Progress bar message for the latest batch.
pub fn format_step_losses(losses: &StepLosses) -> String {
    format!("d_loss {:.4} g_loss {:.4}", losses.d_loss, losses.g_loss)
}

/// Format the end-of-epoch summary line (epochs are shown 1-based).
pub fn format_epoch_summary(epoch: usize, epochs: usize, losses: &StepLosses) -> String {
    format!(
        "epoch {}/{}: mean d_loss {:.4}, mean g_loss {:.4}",
        epoch + 1,
        epochs,
        losses.d_loss,
        losses.g_loss
    )
}

/// Log the end-of-epoch summary at info level, warning on non-finite losses.
pub fn log_epoch_summary(epoch: usize, epochs: usize, losses: &StepLosses) {
    let line = format_epoch_summary(epoch, epochs, losses);
    if losses.d_loss.is_finite() && losses.g_loss.is_finite() {
        log::info!("{line}");
    } else {
        log::warn!("{line} (training has diverged)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_total_ops() {
        assert_eq!(format_total_ops(42), "Total matrix ops: 42");
    }

    #[test]
    fn test_format_step_losses() {
        let l = StepLosses { d_loss: 0.69315, g_loss: 1.5 };
        assert_eq!(format_step_losses(&l), "d_loss 0.6931 g_loss 1.5000");
    }

    #[test]
    fn test_format_epoch_summary() {
        let l = StepLosses { d_loss: 0.12345, g_loss: 2.0 };
        assert_eq!(
            format_epoch_summary(0, 20, &l),
            "epoch 1/20: mean d_loss 0.1235, mean g_loss 2.0000"
        );
    }
}
