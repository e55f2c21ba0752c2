//! Deterministic customer persona fields: names, contact details, addresses.

use super::rng::TableRng;

/// Deterministic persona generator over curated lists.
pub struct NameGenerator;

impl NameGenerator {
    /// Family, middle and given name, Vietnamese order.
    pub fn full_name(rng: &mut TableRng) -> String {
        format!(
            "{} {} {}",
            rng.pick(FAMILY_NAMES),
            rng.pick(MIDDLE_NAMES),
            rng.pick(GIVEN_NAMES)
        )
    }

    /// Email derived from the name: given name, initials, a number.
    pub fn email(rng: &mut TableRng, full_name: &str) -> String {
        let parts: Vec<String> = full_name.split_whitespace().map(fold_ascii).collect();
        let given = parts.last().cloned().unwrap_or_default();
        let initials: String = parts
            .iter()
            .take(parts.len().saturating_sub(1))
            .filter_map(|p| p.chars().next())
            .collect();
        format!(
            "{given}.{initials}{}@{}",
            rng.next_u64_below(1000),
            rng.pick(EMAIL_DOMAINS)
        )
    }

    /// Mobile number in +84 format.
    pub fn phone_number(rng: &mut TableRng) -> String {
        format!(
            "+84 {} {:03} {:04}",
            rng.pick(MOBILE_PREFIXES),
            rng.next_u64_below(1000),
            rng.next_u64_below(10_000)
        )
    }

    pub fn address(rng: &mut TableRng) -> String {
        format!(
            "{} {} Street, {}, {}",
            1 + rng.next_u64_below(300),
            rng.pick(STREETS),
            rng.pick(DISTRICTS),
            rng.pick(CITIES)
        )
    }

    pub fn country(rng: &mut TableRng) -> &'static str {
        *rng.pick(COUNTRIES)
    }
}

/// Lowercase and drop anything outside ASCII letters.
fn fold_ascii(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

const FAMILY_NAMES: &[&str] = &[
    "Nguyen", "Tran", "Le", "Pham", "Hoang", "Huynh", "Phan", "Vu", "Vo", "Dang",
    "Bui", "Do", "Ho", "Ngo", "Duong", "Ly", "Truong", "Dinh", "Lam", "Mai",
];

const MIDDLE_NAMES: &[&str] = &[
    "Van", "Thi", "Minh", "Duc", "Thanh", "Ngoc", "Quoc", "Gia", "Huu", "Anh",
    "Bao", "Kim", "Xuan", "Thu", "Cong",
];

const GIVEN_NAMES: &[&str] = &[
    "An", "Binh", "Chau", "Cuong", "Dung", "Giang", "Ha", "Hai", "Hanh", "Hieu",
    "Hoa", "Hung", "Huong", "Khanh", "Khoa", "Lan", "Linh", "Long", "Mai", "Nam",
    "Ngan", "Nhung", "Phong", "Phuong", "Quan", "Quang", "Son", "Tam", "Thao", "Thu",
    "Trang", "Trung", "Tuan", "Uyen", "Viet", "Vy", "Yen", "Dat", "Duy", "Hau",
];

const EMAIL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com", "example.vn"];

const MOBILE_PREFIXES: &[&str] = &["90", "91", "93", "94", "96", "97", "98", "32", "70", "86"];

const STREETS: &[&str] = &[
    "Le Loi", "Tran Hung Dao", "Nguyen Hue", "Hai Ba Trung", "Ly Thuong Kiet",
    "Dien Bien Phu", "Vo Van Tan", "Pasteur", "Cach Mang Thang Tam", "Hoang Dieu",
];

const DISTRICTS: &[&str] = &[
    "District 1", "District 3", "Binh Thanh", "Phu Nhuan", "Hoan Kiem", "Ba Dinh",
    "Cau Giay", "Hai Chau", "Ninh Kieu", "Thu Duc",
];

const CITIES: &[&str] = &["Ho Chi Minh City", "Ha Noi", "Da Nang", "Can Tho", "Hai Phong"];

const COUNTRIES: &[&str] = &[
    "Vietnam", "Vietnam", "Vietnam", "Vietnam", "Singapore", "Japan", "South Korea",
    "Thailand", "Australia", "United States",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::rng::{RngBank, TableSlot};

    #[test]
    fn names_have_three_parts() {
        let mut rng = RngBank::new(12345).for_table(TableSlot::Customers);
        for _ in 0..100 {
            let name = NameGenerator::full_name(&mut rng);
            assert_eq!(name.split_whitespace().count(), 3, "{name}");
        }
    }

    #[test]
    fn email_is_ascii_and_derived_from_name() {
        let mut rng = RngBank::new(1).for_table(TableSlot::Customers);
        let email = NameGenerator::email(&mut rng, "Nguyen Van An");
        assert!(email.starts_with("an.nv"), "{email}");
        assert!(email.is_ascii());
        assert_eq!(email.matches('@').count(), 1);
    }

    #[test]
    fn same_seed_same_persona() {
        let mut a = RngBank::new(77).for_table(TableSlot::Customers);
        let mut b = RngBank::new(77).for_table(TableSlot::Customers);
        assert_eq!(NameGenerator::full_name(&mut a), NameGenerator::full_name(&mut b));
        assert_eq!(NameGenerator::address(&mut a), NameGenerator::address(&mut b));
    }
}
