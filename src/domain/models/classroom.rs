use serde::{Deserialize, Serialize};

/// Pricing strategy attached to a classroom.
///
/// Each variant carries the equipment that drives its rent surcharge. The
/// variants are a closed set, so this is a tagged enum rather than an open
/// trait hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassRoomType {
    It { computer_count: i32 },
    Math { has_formula_tables: bool },
    English { has_headphones: bool },
}

impl ClassRoomType {
    /// Compute the actual rent from a base rate. Pure; callers are expected
    /// to pass a positive base rate.
    pub fn calculate_rent_cost(&self, base_rate: f64) -> f64 {
        match self {
            ClassRoomType::It { computer_count } => {
                if *computer_count > 0 {
                    base_rate * 1.5 * f64::from(*computer_count) / 10.0
                } else {
                    base_rate * 1.5
                }
            }
            ClassRoomType::Math { has_formula_tables } => {
                if *has_formula_tables {
                    base_rate + 15.0
                } else {
                    base_rate
                }
            }
            ClassRoomType::English { has_headphones } => {
                if *has_headphones {
                    base_rate * 1.2 + 20.0
                } else {
                    base_rate * 1.2
                }
            }
        }
    }

    /// Stable tag used as the first field of persisted classroom records.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ClassRoomType::It { .. } => "IT",
            ClassRoomType::Math { .. } => "MATH",
            ClassRoomType::English { .. } => "ENG",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ClassRoomType::It { computer_count } => {
                format!("IT class, computers: {}", computer_count)
            }
            ClassRoomType::Math { has_formula_tables } => {
                format!("Math class, formula tables: {}", has_formula_tables)
            }
            ClassRoomType::English { has_headphones } => {
                format!("English class, headphones: {}", has_headphones)
            }
        }
    }
}

/// Domain model for a classroom.
///
/// `available` is owned by the lesson engine: it is false while any started
/// lesson occupies the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRoom {
    number: i32,
    available: bool,
    seats_number: i32,
    rent_cost: f64,
    room_type: ClassRoomType,
}

impl ClassRoom {
    pub fn new(
        number: i32,
        available: bool,
        seats_number: i32,
        rent_cost: f64,
        room_type: ClassRoomType,
    ) -> Self {
        Self {
            number,
            available,
            seats_number,
            rent_cost,
            room_type,
        }
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn seats_number(&self) -> i32 {
        self.seats_number
    }

    pub fn rent_cost(&self) -> f64 {
        self.rent_cost
    }

    pub fn room_type(&self) -> &ClassRoomType {
        &self.room_type
    }

    /// Base rate run through the room type's pricing strategy.
    pub fn actual_rent_cost(&self) -> f64 {
        self.room_type.calculate_rent_cost(self.rent_cost)
    }

    /// Rejects non-positive room numbers.
    pub fn set_number(&mut self, number: i32) -> bool {
        if number <= 0 {
            return false;
        }
        self.number = number;
        true
    }

    /// Rejects non-positive rates.
    pub fn set_rent_cost(&mut self, rent_cost: f64) -> bool {
        if rent_cost <= 0.0 {
            return false;
        }
        self.rent_cost = rent_cost;
        true
    }

    /// Rejects non-positive seat counts.
    pub fn set_seats_number(&mut self, seats_number: i32) -> bool {
        if seats_number <= 0 {
            return false;
        }
        self.seats_number = seats_number;
        true
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn describe(&self) -> String {
        format!(
            "ClassRoom number: {}, available: {}, seats: {}, {}",
            self.number,
            self.available,
            self.seats_number,
            self.room_type.describe()
        )
    }
}
