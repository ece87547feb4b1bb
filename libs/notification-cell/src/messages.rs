//! Patient-facing SMS bodies. Dates are `dd.mm.YYYY`, times `HH:MM`.

use crate::models::{AppointmentNotice, NotificationKind};

pub fn confirmation_message(notice: &AppointmentNotice) -> String {
    format!(
        "Sayın {}, randevunuz oluşturulmuştur. Tarih: {} Hekim: Dr. {}",
        notice.patient_name,
        notice.start_time.format("%d.%m.%Y %H:%M"),
        notice.dentist_name
    )
}

pub fn reminder_message(notice: &AppointmentNotice) -> String {
    format!(
        "Sayın {}, {} tarihinde saat {}'de Dr. {} ile randevunuz bulunmaktadır. Lütfen zamanında geliniz.",
        notice.patient_name,
        notice.start_time.format("%d.%m.%Y"),
        notice.start_time.format("%H:%M"),
        notice.dentist_name
    )
}

pub fn cancellation_message(notice: &AppointmentNotice) -> String {
    format!(
        "Sayın {}, {} tarihli randevunuz iptal edilmiştir.",
        notice.patient_name,
        notice.start_time.format("%d.%m.%Y %H:%M")
    )
}

pub fn render(kind: NotificationKind, notice: &AppointmentNotice) -> String {
    match kind {
        NotificationKind::Confirmation => confirmation_message(notice),
        NotificationKind::Reminder => reminder_message(notice),
        NotificationKind::Cancellation => cancellation_message(notice),
    }
}
