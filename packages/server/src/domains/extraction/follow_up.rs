fn field_label(field: &str) -> &str {
    match field {
        "location" => "Lokasi kejadian (desa/kelurahan/alamat lengkap)",
        "name" => "Nama korban",
        "age" => "Umur korban",
        "quantity" => "Jumlah kebutuhan",
        "peopleAffected" => "Jumlah orang yang terdampak",
        other => other,
    }
}

/// Question for the first missing field; one field is asked at a time.
pub fn follow_up_question(missing_fields: &[String]) -> Option<String> {
    missing_fields.first().map(|field| {
        format!(
            "Terima kasih atas laporannya. Untuk melengkapi data, boleh kami tahu: {}?",
            field_label(field)
        )
    })
}
