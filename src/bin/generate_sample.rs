use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let first_names = [
        "Ada", "Bob", "Carol", "Dan", "Eve", "Frank", "Grace", "Hugo", "Iris", "Jack",
    ];
    let last_names = [
        "Lovelace", "Stone", "Reyes", "Kim", "Olsen", "Novak", "Iqbal", "Meyer",
    ];
    let departments = ["Engineering", "Sales", "Marketing", "Finance", "Support"];

    let rows: u32 = 200;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let bold = Format::new().set_bold();
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let headers = ["Name", "Department", "Age", "Salary", "Active", "Hired"];
    for (c, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, c as u16, *header, &bold)
            .expect("Failed to write header");
    }

    for r in 1..=rows {
        let name = format!("{} {}", rng.pick(&first_names), rng.pick(&last_names));
        worksheet.write_string(r, 0, &name).expect("Failed to write name");
        worksheet
            .write_string(r, 1, *rng.pick(&departments))
            .expect("Failed to write department");

        // A few blank ages so blank-cell handling has something to chew on.
        if rng.next_f64() > 0.08 {
            worksheet
                .write_number(r, 2, rng.range(21, 64) as f64)
                .expect("Failed to write age");
        }

        let salary = (rng.gauss(52_000.0, 9_000.0) / 100.0).round() * 100.0;
        worksheet
            .write_number(r, 3, salary.max(28_000.0))
            .expect("Failed to write salary");

        worksheet
            .write_boolean(r, 4, rng.next_f64() < 0.7)
            .expect("Failed to write active");

        // Hire timestamps carry a time of day, so date truncation is visible.
        let hired = (NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + Duration::days(rng.range(0, 3650)))
            .and_hms_opt(
                rng.range(7, 18) as u32,
                rng.range(0, 59) as u32,
                rng.range(0, 59) as u32,
            )
            .unwrap();
        worksheet
            .write_datetime_with_format(r, 5, &hired, &datetime)
            .expect("Failed to write hire date");
    }

    worksheet.autofit();

    let output_path = "sample_data.xlsx";
    workbook.save(output_path).expect("Failed to save workbook");

    println!("Wrote {rows} rows × {} columns to {output_path}", headers.len());
}
