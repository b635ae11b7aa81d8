//! Demo catalogue served by the in-memory gateway when no hosted store is
//! configured.

use chrono::{Duration, Utc};

use super::domain::{
    DealType, GeoPoint, JobDetails, JobType, Listing, ListingDetails, ListingId, ListingStatus,
    OwnerId, PropertyDetails, PropertyType, ServiceCategory, ServiceDetails,
};
use super::province::Province;

/// Phone number that owns part of the demo catalogue; sign in with it to see
/// "my ads".
pub const DEMO_OWNER: &str = "0700112233";
const OTHER_OWNER: &str = "0799887766";

struct Row {
    id: &'static str,
    mine: bool,
    title: &'static str,
    city: &'static str,
    address: &'static str,
    lat: f64,
    lng: f64,
    phone: &'static str,
    approved: bool,
    hours_ago: i64,
}

impl Row {
    fn into_listing(self, details: ListingDetails) -> Listing {
        let owner = if self.mine { DEMO_OWNER } else { OTHER_OWNER };
        let status = if self.approved {
            ListingStatus::Approved
        } else {
            ListingStatus::Pending
        };
        Listing {
            id: ListingId::new(self.id),
            owner_id: OwnerId::new(owner),
            title: self.title.to_string(),
            city: self.city.to_string(),
            province: Province::resolve(self.city),
            address: self.address.to_string(),
            description: String::new(),
            images: vec![format!("https://picsum.photos/800/600?random={}", self.id)],
            phone_number: self.phone.to_string(),
            location: Some(GeoPoint::new(self.lat, self.lng)),
            status,
            created_at: Utc::now() - Duration::hours(self.hours_ago),
            details,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn property(
    price: u64,
    deal_type: DealType,
    property_type: PropertyType,
    bedrooms: u32,
    area: u32,
    features: &[&str],
) -> ListingDetails {
    ListingDetails::Property(PropertyDetails {
        price,
        currency: "AFN".to_string(),
        deal_type,
        property_type,
        bedrooms,
        area,
        has_storage: bedrooms > 2,
        features: strings(features),
    })
}

fn job(company: &str, salary: u64, job_type: JobType, requirements: &[&str]) -> ListingDetails {
    ListingDetails::Job(JobDetails {
        company: company.to_string(),
        salary,
        currency: "AFN".to_string(),
        job_type,
        requirements: strings(requirements),
    })
}

fn service(provider_name: &str, category: ServiceCategory, experience: &str) -> ListingDetails {
    ListingDetails::Service(ServiceDetails {
        provider_name: provider_name.to_string(),
        category,
        experience: experience.to_string(),
    })
}

/// Every demo listing, newest first within each kind. Each kind carries one
/// listing still awaiting moderation.
pub fn demo_listings() -> Vec<Listing> {
    let mut listings = vec![
        Row { id: "6", mine: false, title: "زمین زراعتی در پغمان", city: "کابل", address: "پغمان، کابل", lat: 34.50, lng: 69.10, phone: "0744998877", approved: false, hours_ago: 1 }
            .into_listing(property(500_000, DealType::Sale, PropertyType::Land, 0, 2000, &["آب فراوان"])),
        Row { id: "1", mine: true, title: "آپارتمان لوکس در شهر نو", city: "کابل", address: "شهر نو، کابل", lat: 34.5333, lng: 69.1667, phone: DEMO_OWNER, approved: true, hours_ago: 2 }
            .into_listing(property(8_500_000, DealType::Sale, PropertyType::Apartment, 3, 140, &["گراچ", "لفت", "محافظ"])),
        Row { id: "4", mine: true, title: "آپارتمان ارزان در دشت برچی", city: "کابل", address: "دشت برچی، کابل", lat: 34.49, lng: 69.05, phone: DEMO_OWNER, approved: true, hours_ago: 5 }
            .into_listing(property(500_000, DealType::Mortgage, PropertyType::Apartment, 2, 90, &["آفتاب‌رخ"])),
        Row { id: "2", mine: false, title: "حویلی در وزیر اکبر خان", city: "کابل", address: "وزیر اکبر خان، کابل", lat: 34.54, lng: 69.19, phone: OTHER_OWNER, approved: true, hours_ago: 24 }
            .into_listing(property(60_000, DealType::Rent, PropertyType::House, 5, 450, &["جنراتور", "سرسبزی"])),
        Row { id: "3", mine: false, title: "زمین تجارتی در هرات", city: "هرات", address: "جاده ولایت، هرات", lat: 34.3529, lng: 62.2040, phone: "0700554433", approved: true, hours_ago: 72 }
            .into_listing(property(2_000_000, DealType::Sale, PropertyType::Commercial, 0, 200, &["قباله شرعی"])),
        Row { id: "5", mine: false, title: "باغ و حویلی در مزار شریف", city: "مزار شریف", address: "نزدیک روضه شریف", lat: 36.7119, lng: 67.1107, phone: "0777112233", approved: true, hours_ago: 168 }
            .into_listing(property(12_000_000, DealType::Sale, PropertyType::House, 4, 1000, &["چاه آب"])),
    ];

    listings.extend([
        Row { id: "105", mine: false, title: "منشی دفتر", city: "کابل", address: "شهر نو، کابل", lat: 34.52, lng: 69.16, phone: "0744111222", approved: false, hours_ago: 1 }
            .into_listing(job("شرکت تجارتی", 15_000, JobType::FullTime, &["Word", "Excel"])),
        Row { id: "101", mine: true, title: "برنامه‌نویس وب (React)", city: "کابل", address: "ده افغانان، کابل", lat: 34.515, lng: 69.18, phone: DEMO_OWNER, approved: true, hours_ago: 2 }
            .into_listing(job("افغان سافت", 40_000, JobType::FullTime, &["React", "TypeScript", "Git"])),
        Row { id: "104", mine: true, title: "حسابدار مالی", city: "کابل", address: "تایمنی، کابل", lat: 34.545, lng: 69.17, phone: DEMO_OWNER, approved: true, hours_ago: 3 }
            .into_listing(job("سوپر مارکت بزرگ", 18_000, JobType::PartTime, &["دقت بالا در اعداد"])),
        Row { id: "102", mine: false, title: "بازاریاب فروش", city: "هرات", address: "شهرک صنعتی، هرات", lat: 34.34, lng: 62.19, phone: "0799333444", approved: true, hours_ago: 24 }
            .into_listing(job("شرکت تولیدی نوشابه", 25_000, JobType::FullTime, &["فن بیان عالی"])),
        Row { id: "103", mine: false, title: "گرافیست و ادیتور", city: "مزار شریف", address: "چوک الکوزی، مزار شریف", lat: 36.70, lng: 67.11, phone: "0788555666", approved: true, hours_ago: 48 }
            .into_listing(job("استودیو خلاق", 30_000, JobType::Remote, &["Adobe Suite"])),
    ]);

    listings.extend([
        Row { id: "206", mine: false, title: "آموزش زبان انگلیسی", city: "کابل", address: "داسپیچری، کابل", lat: 34.51, lng: 69.14, phone: "0700000000", approved: false, hours_ago: 1 }
            .into_listing(service("آموزشگاه برتر", ServiceCategory::Education, "۸ سال")),
        Row { id: "201", mine: true, title: "نل دوانی و لوله کشی ماهر", city: "کابل", address: "کوته سنگی، کابل", lat: 34.53, lng: 69.15, phone: DEMO_OWNER, approved: true, hours_ago: 2 }
            .into_listing(service("اوستا رحیم", ServiceCategory::Repair, "۱۰ سال")),
        Row { id: "202", mine: false, title: "برق کاری ساختمان", city: "هرات", address: "چهارراهی مستوفیت، هرات", lat: 34.21, lng: 62.21, phone: "0799654321", approved: true, hours_ago: 3 }
            .into_listing(service("خدمات فنی نور", ServiceCategory::Technical, "۷ سال")),
        Row { id: "205", mine: false, title: "باربری و انتقال اموال", city: "کابل", address: "کمپنی، کابل", lat: 34.50, lng: 69.10, phone: "0744556677", approved: true, hours_ago: 4 }
            .into_listing(service("ترانسپورت عقاب", ServiceCategory::Transport, "۱۵ سال")),
        Row { id: "203", mine: false, title: "تدریس خصوصی ریاضی و فزیک", city: "مزار شریف", address: "کارت صلح، مزار شریف", lat: 36.72, lng: 67.12, phone: "0788112233", approved: true, hours_ago: 24 }
            .into_listing(service("استاد محمدی", ServiceCategory::Education, "۵ سال")),
        Row { id: "204", mine: true, title: "صفا کاری و نظافت منازل", city: "کابل", address: "مکروریان سوم، کابل", lat: 34.55, lng: 69.20, phone: DEMO_OWNER, approved: true, hours_ago: 48 }
            .into_listing(service("شرکت خدماتی پاک", ServiceCategory::Cleaning, "۱۲ سال")),
    ]);

    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::ListingKind;

    #[test]
    fn every_kind_has_one_pending_listing() {
        let listings = demo_listings();
        for kind in ListingKind::ALL {
            let pending = listings
                .iter()
                .filter(|listing| listing.kind() == kind && !listing.is_approved())
                .count();
            assert_eq!(pending, 1, "{kind}");
        }
    }

    #[test]
    fn demo_cities_resolve_to_provinces() {
        assert!(demo_listings()
            .iter()
            .all(|listing| listing.province.is_some()));
    }
}
