//! Bilingual reply templates

use crate::db::NewBooking;
use crate::intent::Language;
use crate::state_machine::BookingDraft;

pub fn greeting(lang: Language) -> &'static str {
    match lang {
        Language::English => {
            "Hello! 👋 I'm the clinic assistant.\nYou can book an appointment, ask about our offers, doctors or location, or cancel a booking."
        }
        Language::Arabic => {
            "مرحبا! 👋 أنا مساعد العيادة.\nتقدر تحجز موعد، أو تسأل عن العروض أو الأطباء أو الموقع، أو تلغي حجزك."
        }
    }
}

pub fn banned(lang: Language) -> &'static str {
    match lang {
        Language::English => {
            "⚠️ Please keep the conversation respectful. Your current request has been cleared."
        }
        Language::Arabic => "⚠️ نرجو الالتزام بأسلوب محترم في المحادثة. تم إلغاء طلبك الحالي.",
    }
}

/// Reply to free text that matches nothing while no flow is running
pub fn help(lang: Language) -> &'static str {
    match lang {
        Language::English => {
            "I can help you with:\n📅 Booking an appointment (type \"book\")\n🎁 Current offers\n👨‍⚕️ Our doctors\n📍 Clinic location\n❌ Cancelling a booking"
        }
        Language::Arabic => {
            "أقدر أساعدك في:\n📅 حجز موعد (اكتب \"حجز\")\n🎁 العروض الحالية\n👨‍⚕️ الأطباء\n📍 موقع العيادة\n❌ إلغاء حجز"
        }
    }
}

pub fn ask_name(lang: Language) -> &'static str {
    match lang {
        Language::English => "Great! Let's book your appointment 📅\nPlease send your full name:",
        Language::Arabic => "ممتاز! خلنا نحجز موعدك 📅\nأرسل اسمك الكامل:",
    }
}

pub fn invalid_name(lang: Language) -> &'static str {
    match lang {
        Language::English => "⚠️ That doesn't look like a name. Please send your full name:",
        Language::Arabic => "⚠️ الاسم غير صحيح. أرسل اسمك الكامل:",
    }
}

pub fn choose_service(lang: Language, name: &str) -> String {
    match lang {
        Language::English => format!("Thanks {name}! Which service would you like?"),
        Language::Arabic => format!("شكرًا {name}! وش الخدمة اللي تحتاجها؟"),
    }
}

pub fn invalid_service(lang: Language) -> &'static str {
    match lang {
        Language::English => "⚠️ Please pick one of the services from the list:",
        Language::Arabic => "⚠️ اختر خدمة من القائمة:",
    }
}

pub fn services_button(lang: Language) -> &'static str {
    match lang {
        Language::English => "Services",
        Language::Arabic => "الخدمات",
    }
}

pub fn choose_slot(lang: Language, service: &str) -> String {
    match lang {
        Language::English => format!("When would you like to come in for {service}?"),
        Language::Arabic => format!("متى يناسبك موعد {service}؟"),
    }
}

pub fn invalid_slot(lang: Language) -> &'static str {
    match lang {
        Language::English => "⚠️ Please pick one of the available times from the list:",
        Language::Arabic => "⚠️ اختر موعد من المواعيد المتاحة:",
    }
}

pub fn no_slots(lang: Language) -> &'static str {
    match lang {
        Language::English => {
            "Sorry, there are no free appointments in the coming days. Please try again later."
        }
        Language::Arabic => "عذرًا، لا توجد مواعيد متاحة في الأيام القادمة. حاول لاحقًا.",
    }
}

pub fn slots_button(lang: Language) -> &'static str {
    match lang {
        Language::English => "Times",
        Language::Arabic => "المواعيد",
    }
}

/// Summary shown before the booking is confirmed
pub fn booking_summary(lang: Language, draft: &BookingDraft) -> String {
    let name = draft.name.as_deref().unwrap_or_default();
    let service = draft.service.as_deref().unwrap_or_default();
    let appointment = draft.appointment.as_deref().unwrap_or_default();
    match lang {
        Language::English => format!(
            "Please confirm your booking:\n👤 {name}\n🦷 {service}\n📅 {appointment}"
        ),
        Language::Arabic => format!("أكد حجزك:\n👤 {name}\n🦷 {service}\n📅 {appointment}"),
    }
}

pub fn confirm_label(lang: Language) -> &'static str {
    match lang {
        Language::English => "Confirm ✅",
        Language::Arabic => "تأكيد ✅",
    }
}

pub fn cancel_label(lang: Language) -> &'static str {
    match lang {
        Language::English => "Cancel ❌",
        Language::Arabic => "إلغاء ❌",
    }
}

pub fn confirm_reprompt(lang: Language) -> &'static str {
    match lang {
        Language::English => "Please reply \"yes\" to confirm or \"no\" to cancel.",
        Language::Arabic => "أرسل \"نعم\" للتأكيد أو \"لا\" للإلغاء.",
    }
}

pub fn booking_discarded(lang: Language) -> &'static str {
    match lang {
        Language::English => "Your booking request has been cancelled. Type \"book\" to start again.",
        Language::Arabic => "تم إلغاء طلب الحجز. اكتب \"حجز\" للبدء من جديد.",
    }
}

pub fn cancel_phone_prompt(lang: Language) -> &'static str {
    match lang {
        Language::English => "To cancel your booking, please send the phone number it was made with:",
        Language::Arabic => "لإلغاء الحجز، أرسل رقم الجوال المسجل في الحجز:",
    }
}

pub fn invalid_cancel_phone(lang: Language) -> &'static str {
    match lang {
        Language::English => "⚠️ Invalid phone number. Please try again:",
        Language::Arabic => "⚠️ رقم الجوال غير صحيح. حاول مرة أخرى:",
    }
}

pub fn cancellation_done(lang: Language, removed: usize) -> String {
    match lang {
        Language::English => format!("✅ Your booking has been cancelled ({removed})."),
        Language::Arabic => format!("✅ تم إلغاء حجزك ({removed})."),
    }
}

pub fn no_booking_found(lang: Language) -> &'static str {
    match lang {
        Language::English => "We couldn't find a booking under that number.",
        Language::Arabic => "ما لقينا حجز بهذا الرقم.",
    }
}

pub fn audio_not_understood(lang: Language) -> &'static str {
    match lang {
        Language::English => "Sorry, I couldn't understand the voice note. Could you type your message?",
        Language::Arabic => "عذرًا، ما قدرت أفهم الرسالة الصوتية. ممكن تكتب رسالتك؟",
    }
}

pub fn offers_caption(lang: Language) -> &'static str {
    match lang {
        Language::English => "🎁 Current offer",
        Language::Arabic => "🎁 العرض الحالي",
    }
}

pub fn doctors_caption(lang: Language) -> &'static str {
    match lang {
        Language::English => "👨‍⚕️ Our doctors",
        Language::Arabic => "👨‍⚕️ أطباؤنا",
    }
}

/// Sent instead of pictures when the catalog has none configured
pub fn media_unavailable(lang: Language) -> &'static str {
    match lang {
        Language::English => "Details are not available right now. Please contact the clinic.",
        Language::Arabic => "التفاصيل غير متوفرة حاليًا. تواصل مع العيادة من فضلك.",
    }
}

pub fn contact_line(lang: Language) -> &'static str {
    match lang {
        Language::English => "📞 For bookings or questions, contact us any time!",
        Language::Arabic => "📞 للحجز أو الاستفسار، تواصل معنا الآن!",
    }
}

/// Confirmation notice for a booked appointment
pub fn booking_confirmed(lang: Language, clinic: &str, booking: &NewBooking) -> String {
    match lang {
        Language::English => format!(
            "👋 Hello {}!\nYour {} appointment at {clinic} is booked 🦷\n📅 {}",
            booking.name, booking.service, booking.appointment
        ),
        Language::Arabic => format!(
            "👋 مرحبًا {}!\nتم حجز موعدك لخدمة {} في {clinic} 🦷\n📅 {}",
            booking.name, booking.service, booking.appointment
        ),
    }
}

/// Text-only notice carrying the same content as the image caption
pub fn booking_confirmed_text(lang: Language, clinic: &str, booking: &NewBooking) -> String {
    format!(
        "{}\n\n{}",
        booking_confirmed(lang, clinic, booking),
        contact_line(lang)
    )
}
