//! The saved city list and the active pointer.
//!
//! # Invariants
//! - `active` is `None` exactly when `cities` is empty.
//! - When `cities` is non-empty, `active` indexes an element of it.
//!
//! The registry only holds state. Saving, fetching and rendering after a
//! mutation is the dashboard's job.

use tracing::{info, warn};

use crate::{error::RegistryError, model::City};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRegistry {
    cities: Vec<City>,
    active: Option<usize>,
}

impl CityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a stored list. The first city becomes active; selection is not
    /// remembered across restarts.
    pub fn from_saved(cities: Vec<City>) -> Self {
        let active = if cities.is_empty() { None } else { Some(0) };
        Self { cities, active }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn active(&self) -> Option<&City> {
        self.active.and_then(|i| self.cities.get(i))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn contains_place(&self, name: &str, country: Option<&str>) -> bool {
        self.cities.iter().any(|c| c.same_place(name, country))
    }

    /// Append a city chosen by the user and make it active.
    pub fn add(&mut self, city: City) -> Result<(), RegistryError> {
        if self.contains_place(&city.name, city.country.as_deref()) {
            return Err(RegistryError::DuplicateCity);
        }
        info!(city = %city.label(), "Adding city");
        self.push_active(city);
        Ok(())
    }

    /// Append the geolocated city and make it active. No duplicate check.
    pub fn seed_located(&mut self, city: City) {
        info!(lat = city.lat, lon = city.lon, "Seeding city from device location");
        self.push_active(city);
    }

    /// Remove the city at `index`. The first remaining city becomes active,
    /// whichever city was active before.
    ///
    /// Returns `None` for an index outside the list; that only happens on a
    /// caller bug, since indices come from the rendered list.
    pub fn remove(&mut self, index: usize) -> Option<City> {
        if index >= self.cities.len() {
            warn!(index, len = self.cities.len(), "Ignoring removal outside the city list");
            return None;
        }

        let removed = self.cities.remove(index);
        self.active = if self.cities.is_empty() { None } else { Some(0) };
        info!(city = %removed.label(), remaining = self.cities.len(), "Removed city");
        Some(removed)
    }

    /// Make an existing member active.
    pub fn select(&mut self, city: &City) -> Result<(), RegistryError> {
        let index = self.cities.iter().position(|c| c == city).ok_or(RegistryError::NotMember)?;
        self.active = Some(index);
        Ok(())
    }

    pub fn select_at(&mut self, index: usize) -> Result<&City, RegistryError> {
        let city = self.cities.get(index).ok_or(RegistryError::NotMember)?;
        self.active = Some(index);
        Ok(city)
    }

    fn push_active(&mut self, city: City) {
        self.cities.push(city);
        self.active = Some(self.cities.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    fn london() -> City {
        City::new("London", Some("GB".into()), 51.5, -0.1)
    }

    fn paris() -> City {
        City::new("Paris", Some("FR".into()), 48.85, 2.35)
    }

    fn rome() -> City {
        City::new("Rome", Some("IT".into()), 41.9, 12.5)
    }

    fn assert_invariant(reg: &CityRegistry) {
        match reg.active_index() {
            None => assert!(reg.is_empty()),
            Some(i) => assert!(i < reg.len()),
        }
    }

    #[test]
    fn from_saved_activates_first() {
        let reg = CityRegistry::from_saved(vec![paris(), london()]);
        assert_eq!(reg.active(), Some(&paris()));

        let empty = CityRegistry::from_saved(Vec::new());
        assert_eq!(empty.active(), None);
    }

    #[test]
    fn add_appends_and_activates() {
        let mut reg = CityRegistry::from_saved(vec![london()]);
        reg.add(paris()).expect("add");
        assert_eq!(reg.cities(), &[london(), paris()]);
        assert_eq!(reg.active(), Some(&paris()));
    }

    #[test]
    fn duplicate_is_rejected_without_mutation() {
        let mut reg = CityRegistry::from_saved(vec![london(), paris()]);
        reg.select_at(1).expect("select");
        let before = reg.clone();

        let err = reg.add(City::new("LONDON", Some("gb".into()), 0.0, 0.0)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateCity);
        assert_eq!(reg, before);
    }

    #[test]
    fn same_name_other_country_is_not_duplicate() {
        let mut reg = CityRegistry::from_saved(vec![london()]);
        reg.add(City::new("London", Some("CA".into()), 42.98, -81.25)).expect("add");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn seeded_location_never_blocks_search_add() {
        let mut reg = CityRegistry::new();
        reg.seed_located(City::current_location(Coordinates { latitude: 1.0, longitude: 2.0 }));
        reg.add(City::new("Current location", Some("US".into()), 0.0, 0.0)).expect("add");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn removing_active_promotes_first() {
        let mut reg = CityRegistry::from_saved(vec![london(), paris()]);
        let removed = reg.remove(0);
        assert_eq!(removed, Some(london()));
        assert_eq!(reg.cities(), &[paris()]);
        assert_eq!(reg.active(), Some(&paris()));
    }

    #[test]
    fn removing_active_from_middle_promotes_first() {
        let mut reg = CityRegistry::from_saved(vec![london(), paris(), rome()]);
        reg.select_at(1).expect("select");
        reg.remove(1);
        assert_eq!(reg.active(), Some(&london()));
    }

    #[test]
    fn removing_other_city_activates_first() {
        let mut reg = CityRegistry::from_saved(vec![london(), paris(), rome()]);
        reg.select_at(2).expect("select");
        reg.remove(0);
        assert_eq!(reg.active(), Some(&paris()));
        assert_eq!(reg.active_index(), Some(0));
    }

    #[test]
    fn removing_city_after_active_activates_first() {
        let mut reg = CityRegistry::from_saved(vec![london(), paris(), rome()]);
        reg.select_at(1).expect("select");
        reg.remove(2);
        assert_eq!(reg.active(), Some(&london()));
    }

    #[test]
    fn removing_last_city_clears_active() {
        let mut reg = CityRegistry::from_saved(vec![london()]);
        reg.remove(0);
        assert!(reg.is_empty());
        assert_eq!(reg.active(), None);
    }

    #[test]
    fn out_of_bounds_remove_is_ignored() {
        let mut reg = CityRegistry::from_saved(vec![london()]);
        assert_eq!(reg.remove(3), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn select_requires_membership() {
        let mut reg = CityRegistry::from_saved(vec![london(), paris()]);
        reg.select(&paris()).expect("member");
        assert_eq!(reg.active(), Some(&paris()));
        assert_eq!(reg.select(&rome()), Err(RegistryError::NotMember));
        assert_eq!(reg.active(), Some(&paris()));
    }

    #[test]
    fn invariant_holds_over_mixed_operations() {
        let mut reg = CityRegistry::new();
        let pool = [london(), paris(), rome()];
        // Deterministic walk over adds, duplicate adds and removals.
        for step in 0..60usize {
            match step % 5 {
                0 | 1 => {
                    let _ = reg.add(pool[step % pool.len()].clone());
                }
                2 => {
                    if !reg.is_empty() {
                        let _ = reg.select_at(step % reg.len());
                    }
                }
                _ => {
                    if !reg.is_empty() {
                        reg.remove((step * 7) % reg.len());
                    }
                }
            }
            assert_invariant(&reg);
        }
    }
}
